// normalize.rs - Identity field normalization

/// Normalize an email for identity comparison: trim and lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize a phone number for identity comparison: digits only.
///
/// `555-1234`, `(555) 1234` and `555 1234` all normalize to `5551234`.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a person name for comparison: collapse whitespace, lowercase.
pub fn normalize_name(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Normalize an answer string for dedup comparison only.
/// Original casing is what gets stored.
pub fn normalize_answer(answer: &str) -> String {
    collapse_whitespace(answer).to_lowercase()
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@X.COM "), "jane@x.com");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("555-1234"), "5551234");
        assert_eq!(normalize_phone("(555) 1234"), "5551234");
        assert_eq!(normalize_phone("+1 555 123 4567"), "15551234567");
        assert_eq!(normalize_phone("n/a"), "");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Jane   Doe "), "jane doe");
        assert_eq!(normalize_name("JANE DOE"), "jane doe");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a\t b\n  c"), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
