//! Queries against a live MySQL server.
//!
//! Ignored by default. Set `DATABASE_URL` (or put it in `.env`) and run
//! `cargo test -- --ignored`. Each test owns its table.

use sqlx::MySqlPool;
use sqlx_typed_bind::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Record {
    id: u32,
    i: i32,
    s: String,
}

impl Record {
    fn new(id: u32, i: i32, s: &str) -> Self {
        Self {
            id,
            i,
            s: s.to_owned(),
        }
    }
}

async fn connect() -> Option<MySqlPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set, skipping");
        return None;
    };
    Some(MySqlPool::connect(&url).await.unwrap())
}

fn records(name: &str) -> Table<Record> {
    Table::builder(name)
        .column(
            make_column(
                "id",
                field!(Record, id),
                &[Constraint::PrimaryKey, Constraint::Autoincrement],
            )
            .unwrap(),
        )
        .column(make_column("i", field!(Record, i), &[]).unwrap())
        .column(make_varchar("s", 32, field!(Record, s), &[]).unwrap())
        .build()
        .unwrap()
}

fn initial() -> Vec<Record> {
    vec![
        Record::new(1, 1, "one"),
        Record::new(2, 2, "two"),
        Record::new(3, 4, "four"),
    ]
}

async fn setup(pool: &MySqlPool, table: &Table<Record>) {
    table.recreate(pool).await.unwrap();
    let mut insert = table.insert().prepare().unwrap();
    for record in initial() {
        insert.bind_record(&record);
        insert.execute(pool).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_select_all() {
    let Some(pool) = connect().await else { return };
    let table = records("it_select_all");
    setup(&pool, &table).await;

    let rows = table.get_all().prepare().unwrap().fetch_all(&pool).await.unwrap();
    assert_eq!(rows, initial());

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_select_where() {
    let Some(pool) = connect().await else { return };
    let table = records("it_select_where");
    setup(&pool, &table).await;

    let rows = table
        .select()
        .filter(col(field!(Record, i)).eq(4))
        .prepare()
        .unwrap()
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows, vec![Record::new(3, 4, "four")]);

    let rows = table
        .select()
        .filter(col(field!(Record, i)).eq(7))
        .prepare()
        .unwrap()
        .fetch_all(&pool)
        .await
        .unwrap();
    assert!(rows.is_empty());

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_select_only_leaves_other_fields_default() {
    let Some(pool) = connect().await else { return };
    let table = records("it_select_only");
    setup(&pool, &table).await;

    let mut statement = table
        .select_only(&[field!(Record, s).attr()])
        .unwrap()
        .filter(col(field!(Record, id)).eq(2))
        .prepare()
        .unwrap();
    let record = statement.fetch_one(&pool).await.unwrap();
    assert_eq!(record, Record::new(0, 0, "two"));

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_insert_returns_generated_id() {
    let Some(pool) = connect().await else { return };
    let table = records("it_insert_id");
    setup(&pool, &table).await;

    let eight = Record::new(0, 8, "eight");
    let id = table
        .insert_all_but(&[field!(Record, id).attr()])
        .unwrap()
        .values(&eight)
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();
    assert!(id > 3);

    let rows = table.select().prepare().unwrap().fetch_all(&pool).await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], Record::new(id as u32, 8, "eight"));

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_update_set_where() {
    let Some(pool) = connect().await else { return };
    let table = records("it_update");
    setup(&pool, &table).await;

    let changed = table
        .update()
        .set(col(field!(Record, i)).assign(3))
        .filter(col(field!(Record, id)).eq(2))
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let rows = table.select().prepare().unwrap().fetch_all(&pool).await.unwrap();
    assert_eq!(
        rows,
        vec![
            Record::new(1, 1, "one"),
            Record::new(2, 3, "two"),
            Record::new(3, 4, "four"),
        ]
    );

    let changed = table
        .update()
        .set((
            col(field!(Record, s)).assign("many"),
            col(field!(Record, i)).assign(0),
        ))
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(changed, 3);

    let rows = table.select().prepare().unwrap().fetch_all(&pool).await.unwrap();
    assert!(rows.iter().all(|r| r.s == "many" && r.i == 0));

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_var_is_reread_on_each_execution() {
    let Some(pool) = connect().await else { return };
    let table = records("it_var");
    setup(&pool, &table).await;

    let min = Var::new(2);
    let limit = Var::new(10u64);
    let mut statement = table
        .select()
        .filter(col(field!(Record, i)).ge(&min))
        .limit(&limit)
        .prepare()
        .unwrap();
    assert_eq!(
        statement.sql(),
        "SELECT `id`, `i`, `s` FROM `it_var` WHERE `i`>=? LIMIT ?"
    );

    assert_eq!(statement.fetch_all(&pool).await.unwrap().len(), 2);

    min.set(1);
    assert_eq!(statement.fetch_all(&pool).await.unwrap().len(), 3);

    limit.set(1);
    let rows = statement.fetch_all(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);

    min.set(5);
    assert!(statement.fetch_optional(&pool).await.unwrap().is_none());
    let err = statement.fetch_one(&pool).await.unwrap_err();
    assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_delete() {
    let Some(pool) = connect().await else { return };
    let table = records("it_delete");
    setup(&pool, &table).await;

    let deleted = table
        .delete()
        .filter(col(field!(Record, i)).lt(3))
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let deleted = table
        .delete()
        .filter(col(field!(Record, s)).eq("nothing"))
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    let rows = table.select().prepare().unwrap().fetch_all(&pool).await.unwrap();
    assert_eq!(rows, vec![Record::new(3, 4, "four")]);

    let deleted = table.delete().limit(5).prepare().unwrap().execute(&pool).await.unwrap();
    assert_eq!(deleted, 1);

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_text_longer_than_varchar_is_truncated() {
    let Some(pool) = connect().await else { return };
    let wide = records("it_truncated");
    setup(&pool, &wide).await;

    let narrow = Table::builder("it_truncated")
        .column(make_column("id", field!(Record, id), &[]).unwrap())
        .column(make_varchar("s", 3, field!(Record, s), &[]).unwrap())
        .build()
        .unwrap();

    let mut statement = narrow
        .select()
        .filter(col(field!(Record, id)).eq(1))
        .prepare()
        .unwrap();
    assert_eq!(
        statement.fetch_one(&pool).await.unwrap(),
        Record::new(1, 0, "one")
    );

    let err = narrow
        .select()
        .filter(col(field!(Record, id)).eq(3))
        .prepare()
        .unwrap()
        .fetch_all(&pool)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Truncated { capacity: 3, .. }));

    wide.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_missing_table() {
    let Some(pool) = connect().await else { return };
    let table = records("it_missing");
    table.drop(&pool).await.unwrap();

    let err = table
        .select()
        .prepare()
        .unwrap()
        .fetch_all(&pool)
        .await
        .unwrap_err();
    assert!(err.is_table_does_not_exist());
    assert_eq!(err.error_number(), Some(1146));
}
