/// Query that lets each shard pre-aggregate its own rows:
/// `SELECT <key>, SUM(<value>) AS <alias> FROM <relation> GROUP BY <key>`.
///
/// Identifiers are interpolated verbatim; callers validate them with
/// [`is_identifier`] first.
pub fn grouped_sum(relation: &str, key_column: &str, value_column: &str, alias: &str) -> String {
    format!(
        "SELECT {key_column}, SUM({value_column}) AS {alias} FROM {relation} GROUP BY {key_column}"
    )
}

/// Plain SQL identifier: a letter or underscore followed by letters, digits
/// or underscores. Optionally schema-qualified with a single dot.
pub fn is_identifier(name: &str) -> bool {
    let mut parts = name.split('.');
    let valid = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    match (parts.next(), parts.next(), parts.next()) {
        (Some(single), None, _) => valid(single),
        (Some(schema), Some(table), None) => valid(schema) && valid(table),
        _ => false,
    }
}
