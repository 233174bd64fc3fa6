//! SQL quoting for statements passed to `psql -c`.

/// Quote an identifier (database, role, schema name).
/// Wraps in double quotes and doubles embedded double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal. Wraps in single quotes and doubles embedded ones.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
