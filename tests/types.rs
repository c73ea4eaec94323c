//! Round trips of every supported field type through a live MySQL server.
//!
//! Ignored by default; run with `cargo test -- --ignored` and `DATABASE_URL` set.

use sqlx::MySqlPool;
use sqlx_typed_bind::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Sample {
    id: u64,
    flag: bool,
    tiny: i8,
    small: u16,
    big: i64,
    note: Option<String>,
    count: Option<u32>,
    when: Tm,
    seen: Option<Tm>,
}

async fn connect() -> Option<MySqlPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set, skipping");
        return None;
    };
    Some(MySqlPool::connect(&url).await.unwrap())
}

fn samples(name: &str) -> Table<Sample> {
    Table::builder(name)
        .column(
            make_column(
                "id",
                field!(Sample, id),
                &[Constraint::PrimaryKey, Constraint::Autoincrement],
            )
            .unwrap(),
        )
        .column(make_column("flag", field!(Sample, flag), &[]).unwrap())
        .column(make_column("tiny", field!(Sample, tiny), &[]).unwrap())
        .column(make_column("small", field!(Sample, small), &[]).unwrap())
        .column(make_column("big", field!(Sample, big), &[]).unwrap())
        .column(make_varchar("note", 64, field!(Sample, note), &[]).unwrap())
        .column(make_column("count", field!(Sample, count), &[]).unwrap())
        .column(make_column("when", field!(Sample, when), &[]).unwrap())
        .column(make_column("seen", field!(Sample, seen), &[]).unwrap())
        .build()
        .unwrap()
}

fn full() -> Sample {
    Sample {
        id: 0,
        flag: true,
        tiny: -7,
        small: 65535,
        big: -9_000_000_000,
        note: Some("hello".to_owned()),
        count: Some(42),
        when: Tm::new(2018, 1, 2, 3, 4, 5),
        seen: Some(Tm::new(2020, 2, 29, 23, 59, 59)),
    }
}

fn sparse() -> Sample {
    Sample {
        id: 0,
        flag: false,
        tiny: 0,
        small: 0,
        big: 0,
        note: None,
        count: None,
        when: Tm::new(1999, 12, 31, 0, 0, 0),
        seen: None,
    }
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_round_trip() {
    let Some(pool) = connect().await else { return };
    let table = samples("it_types_round_trip");
    table.recreate(&pool).await.unwrap();

    let mut insert = table
        .insert_all_but(&[field!(Sample, id).attr()])
        .unwrap()
        .prepare()
        .unwrap();
    let mut expected = Vec::new();
    for mut sample in [full(), sparse()] {
        insert.bind_record(&sample);
        sample.id = insert.execute(&pool).await.unwrap();
        expected.push(sample);
    }

    let rows = table.select().prepare().unwrap().fetch_all(&pool).await.unwrap();
    assert_eq!(rows, expected);

    // Derived calendar fields are recomputed on the way out.
    assert_eq!(rows[0].when.wday, 2);
    assert_eq!(rows[0].when.yday, 1);
    assert_eq!(rows[0].when.isdst, -1);

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_null_conditions_and_assignments() {
    let Some(pool) = connect().await else { return };
    let table = samples("it_types_null");
    table.recreate(&pool).await.unwrap();

    let mut insert = table
        .insert_all_but(&[field!(Sample, id).attr()])
        .unwrap()
        .prepare()
        .unwrap();
    for sample in [full(), sparse()] {
        insert.bind_record(&sample);
        insert.execute(&pool).await.unwrap();
    }

    let changed = table
        .update()
        .set((
            col(field!(Sample, note)).assign(None),
            col(field!(Sample, count)).assign(7),
        ))
        .filter(col(field!(Sample, flag)).eq(true))
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let row = table
        .select()
        .filter(col(field!(Sample, flag)).eq(true))
        .prepare()
        .unwrap()
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.note, None);
    assert_eq!(row.count, Some(7));

    let after = Var::new(Tm::new(2000, 1, 1, 0, 0, 0));
    let mut statement = table
        .select_only(&[field!(Sample, when).attr()])
        .unwrap()
        .filter(col(field!(Sample, when)).gt(&after))
        .prepare()
        .unwrap();
    let rows = statement.fetch_all(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].when, Tm::new(2018, 1, 2, 3, 4, 5));

    after.set(Tm::new(1990, 1, 1, 0, 0, 0));
    assert_eq!(statement.fetch_all(&pool).await.unwrap().len(), 2);

    table.drop(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a MySQL server at DATABASE_URL"]
async fn test_null_into_non_optional_field_is_default() {
    let Some(pool) = connect().await else { return };
    let table = samples("it_types_default");
    table.recreate(&pool).await.unwrap();

    let mut insert = table
        .insert_all_but(&[field!(Sample, id).attr()])
        .unwrap()
        .prepare()
        .unwrap();
    insert.bind_record(&full());
    insert.execute(&pool).await.unwrap();

    // A table whose `count` field is not optional reads NULL as 0.
    #[derive(Debug, Default)]
    struct Counted {
        count: u32,
        note: String,
    }
    let counted = Table::builder("it_types_default")
        .column(make_column("count", field!(Counted, count), &[]).unwrap())
        .column(make_column("note", field!(Counted, note), &[]).unwrap())
        .build()
        .unwrap();

    table
        .update()
        .set((
            col(field!(Sample, count)).assign(None),
            col(field!(Sample, note)).assign(None),
        ))
        .prepare()
        .unwrap()
        .execute(&pool)
        .await
        .unwrap();

    let row = counted.select().prepare().unwrap().fetch_one(&pool).await.unwrap();
    assert_eq!(row.count, 0);
    assert_eq!(row.note, "");

    table.drop(&pool).await.unwrap();
}
