//! Egyptian phone number normalization.

/// Normalize a user-typed Egyptian phone number to `+20…` form.
///
/// Arabic-Indic and Persian digits are accepted. Everything except digits is
/// dropped, as is a leading international prefix (`+` or `00`). A national
/// trunk `0` becomes the `20` country code and a bare ten-digit subscriber
/// number gets `20` prepended. Numbers shorter than eleven digits are
/// rejected.
///
/// ```
/// use hrtaj_core::normalize_egypt_phone;
///
/// assert_eq!(normalize_egypt_phone("010 0000 0001").as_deref(), Some("+201000000001"));
/// assert_eq!(normalize_egypt_phone("١٢٣"), None);
/// ```
#[must_use]
pub fn normalize_egypt_phone(input: &str) -> Option<String> {
    let cleaned: String = input
        .chars()
        .filter_map(|c| match c {
            '0'..='9' | '+' => Some(c),
            '\u{0660}'..='\u{0669}' => char::from_digit(u32::from(c) - 0x0660, 10),
            '\u{06F0}'..='\u{06F9}' => char::from_digit(u32::from(c) - 0x06F0, 10),
            _ => None,
        })
        .collect();

    let mut digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if let Some(rest) = digits.strip_prefix("00") {
        digits = rest;
    }
    // Any further '+' is noise typed mid-number.
    let digits: String = digits.chars().filter(char::is_ascii_digit).collect();

    let national = if let Some(rest) = digits.strip_prefix('0') {
        format!("20{rest}")
    } else if digits.len() == 10 {
        format!("20{digits}")
    } else {
        digits
    };

    if national.len() < 11 {
        return None;
    }
    Some(format!("+{national}"))
}
