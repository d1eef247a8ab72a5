//! Email address validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::LeadError;

/// Whitespace as browsers define it for `\s`: ASCII blanks, the Unicode space
/// separators, line/paragraph separators and the byte order mark. Unlike the
/// Unicode `White_Space` property this excludes U+0085.
const WHITESPACE: &str =
    r"\t\n\x0B\x0C\r\x20\xA0\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

/// `local@domain.tld`: no whitespace or `@` in any part, at least one dot after the `@`.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let part = format!("[^@{WHITESPACE}]+");
    Regex::new(&format!(r"^{part}@{part}\.{part}$")).expect("valid email regex")
});

/// An email address that passed format validation.
///
/// Comparison is exact and case-sensitive; the address is stored as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate a raw address.
    pub fn parse(raw: impl Into<String>) -> Result<Self, LeadError> {
        let raw = raw.into();
        if EMAIL_PATTERN.is_match(&raw) {
            Ok(Self(raw))
        } else {
            Err(LeadError::InvalidEmail)
        }
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the address.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_addresses() {
        for raw in ["a@b.com", "first.last+tag@mail.example.co.uk", "x@y.z"] {
            assert!(EmailAddress::parse(raw).is_ok(), "{raw} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for raw in [
            "",
            "notanemail",
            "a@b",
            "@b.com",
            "a@.com",
            "a@b.",
            "a@@b.com",
            "a b@c.com",
            " a@b.com",
            "a@b.com ",
            "a@b@c.com",
        ] {
            assert!(
                matches!(EmailAddress::parse(raw), Err(LeadError::InvalidEmail)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_browser_whitespace() {
        for raw in [
            "a\u{feff}b@c.com",
            "a@b\u{00a0}c.com",
            "a@b.c\u{3000}om",
            "a\u{2028}@b.com",
            "a\tb@c.com",
        ] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_next_line_is_not_whitespace() {
        assert!(EmailAddress::parse("a\u{0085}b@c.com").is_ok());
    }

    #[test]
    fn test_preserves_case() {
        let email = EmailAddress::parse("Alice@Example.COM").unwrap();

        assert_eq!(email.as_str(), "Alice@Example.COM");
        assert_ne!(email, EmailAddress::parse("alice@example.com").unwrap());
    }
}
