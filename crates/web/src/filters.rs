//! Askama filters for the bilingual pages.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Year of the footer copyright line.
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Numbers as Arabic pages show them: `2026` becomes `٢٠٢٦`.
///
/// Usage in templates: `{{ ""|current_year|arabic_digits }}`
#[askama::filter_fn]
pub fn arabic_digits(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(to_arabic_indic(&value.to_string()))
}

/// Replace ASCII digits with Arabic-Indic ones, leaving everything else.
pub(crate) fn to_arabic_indic(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => char::from_u32(0x0660 + d).unwrap_or(c),
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_arabic_indic() {
        assert_eq!(to_arabic_indic("2026"), "٢٠٢٦");
        assert_eq!(to_arabic_indic("Page 3 of 10"), "Page ٣ of ١٠");
        assert_eq!(to_arabic_indic("٣"), "٣");
        assert_eq!(to_arabic_indic(""), "");
    }
}
