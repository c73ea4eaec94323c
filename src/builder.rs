use regex::Regex;

/// Wraps a table or column name in backticks after checking it is a plain identifier.
///
/// Names are never escaped: anything outside `[A-Za-z_][A-Za-z0-9_$]*` is rejected.
///
/// # Examples
///
/// ```
/// use sqlx_typed_bind::builder::quote_identifier;
///
/// assert_eq!(quote_identifier("records")?, "`records`");
/// assert!(quote_identifier("bad`name").is_err());
/// # Ok::<(), sqlx_typed_bind::Error>(())
/// ```
pub fn quote_identifier(name: &str) -> crate::Result<String> {
    check_identifier(name)?;
    Ok(format!("`{name}`"))
}

/// Validates a table or column name.
pub fn check_identifier(name: &str) -> crate::Result<()> {
    let regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$")?;
    if regex.is_match(name) {
        Ok(())
    } else {
        Err(crate::Error::InvalidIdentifier(name.to_owned()))
    }
}

/// Counts the positional placeholders (`?`) of a rendered query.
///
/// Rendered queries never contain string literals, so every `?` is a bind slot.
pub fn count_placeholders(sql: &str) -> crate::Result<usize> {
    let regex = Regex::new(r"\?")?;
    Ok(regex.find_iter(sql).count())
}

/// Appends `items` to `out`, separated by `", "`.
pub(crate) fn push_joined<I, S>(out: &mut String, items: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(item.as_ref());
    }
}
