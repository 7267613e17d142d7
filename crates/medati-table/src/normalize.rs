//! Column-name normalization.
//!
//! The target database only accepts lowercase identifiers without punctuation, so
//! every CSV header is trimmed, lowercased and run through [`SUBSTITUTIONS`].

/// Characters rewritten in column names, in application order.
///
/// No replacement contains a character that appears as a key, so applying the table
/// in a single pass gives the same result as applying the entries one after another.
pub const SUBSTITUTIONS: &[(char, &str)] = &[
    ('/', "_"),
    ('\\', "_"),
    (' ', "_"),
    ('-', "_"),
    (':', "_"),
    (',', "_"),
    ('.', "_"),
    ('+', "_"),
    ('%', "_"),
    ('!', "_"),
    ('?', "_"),
    ('(', "_"),
    (')', "_"),
    ('[', "_"),
    (']', "_"),
    ('}', "_"),
    ('{', "_"),
    ('ß', "ss"),
    ('ä', "ae"),
    ('ö', "oe"),
    ('ü', "ue"),
];

fn substitution(ch: char) -> Option<&'static str> {
    SUBSTITUTIONS
        .iter()
        .find_map(|(from, to)| (*from == ch).then_some(*to))
}

/// Normalize a single raw column name.
///
/// ```
/// use medati_table::normalize_column_name;
///
/// assert_eq!(normalize_column_name("  Installed Capacity (MW) "), "installed_capacity__mw_");
/// assert_eq!(normalize_column_name("Größe"), "groesse");
/// ```
pub fn normalize_column_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        match substitution(ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

/// Normalize an ordered list of raw column names, preserving order.
pub fn normalize_column_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|name| normalize_column_name(name.as_ref()))
        .collect()
}
