//! Canonical player identity. The same routine runs at ingestion time and at
//! query time; any second copy of this logic is a correctness bug.

/// Derived identity key for a display name: lower-cased, punctuation
/// stripped, collapsed to `"<first-initial> <last-token>"` when the name has
/// at least two tokens, else the lower-cased whole name. Empty or
/// whitespace-only input yields the empty key, which is never matched.
///
/// The collapse is intentionally coarse: "Jane Doe" and "Jake Doe" share the
/// key "j doe". The source data never disambiguates by school, so two
/// distinct players sharing initial and surname merge.
pub fn canonical_key(display_name: &str) -> String {
    key_from_tokens(&name_tokens(display_name))
}

/// Cleaned name tokens: lower-cased, punctuation removed within each token.
pub fn name_tokens(display_name: &str) -> Vec<String> {
    display_name
        .to_lowercase()
        .split_whitespace()
        .map(|tok| tok.chars().filter(|ch| ch.is_alphanumeric()).collect())
        .filter(|tok: &String| !tok.is_empty())
        .collect()
}

pub fn key_from_tokens(tokens: &[String]) -> String {
    match tokens {
        [] => String::new(),
        [only] => only.clone(),
        [first, .., last] => {
            let Some(initial) = first.chars().next() else {
                return String::new();
            };
            format!("{initial} {last}")
        }
    }
}
