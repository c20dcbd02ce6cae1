/// Names used when the user loads nothing (or only separators and whitespace).
pub const DEFAULT_NAMES: [&str; 6] = ["Shruti", "Naman", "Keta", "Kuldip", "Praful", "Viren"];

/// Shown on the wheel when chosen-once has run dry. Never selectable.
pub const EXHAUSTED_SENTINEL: &str = "Game Over";

pub fn default_names() -> Vec<String> {
    DEFAULT_NAMES.iter().map(|n| n.to_string()).collect()
}

/// Split free text on commas and line breaks, trim, drop empties.
///
/// Order of appearance is kept and duplicates stay as separate slots.
/// Falls back to [`DEFAULT_NAMES`] when nothing usable is left.
pub fn parse_names(raw: &str) -> Vec<String> {
    let parsed: Vec<String> = raw
        .split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        default_names()
    } else {
        parsed
    }
}
