//! Text helpers for hardware addresses and vendor names.

/// Keep only ASCII hex digits, lowercased.
pub fn strip_hex(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Drop every non-printable character (control characters, stray `\r`, etc).
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| !c.is_control()).collect()
}

/// Normalize anything MAC-like to lowercase colon-separated hex (aa:bb:cc:dd:ee:ff)
pub fn prettify(dirty: &str) -> String {
    strip_hex(&sanitize(dirty))
        .chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}
