//! Route handlers and shared validation helpers.

pub mod health;
pub mod registration_finalize;
pub mod registration_initialize;
pub mod storage;

pub use self::health::health;

use regex::Regex;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Usernames must be present and longer than two characters.
pub fn valid_username(username: &str) -> bool {
    username.chars().count() > 2
}

/// Credential policy: 8 to 128 characters with at least one letter and one
/// digit.
pub fn valid_password(password: &str) -> bool {
    let length = password.chars().count();
    if !(8..=128).contains(&length) {
        return false;
    }

    password.chars().any(char::is_alphabetic) && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_valid_email() {
        assert!(valid_email("alice@example.test"));
        assert!(valid_email("a.b+c@sub.example.test"));

        assert!(!valid_email(""));
        assert!(!valid_email("alice"));
        assert!(!valid_email("alice@nodot"));
        assert!(!valid_email("alice@@example.test"));
        assert!(!valid_email("alice @example.test"));
    }

    #[test]
    fn test_valid_username() {
        assert!(valid_username("abc"));
        assert!(valid_username("alice"));

        assert!(!valid_username(""));
        assert!(!valid_username("a"));
        assert!(!valid_username("ab"));
    }

    #[test]
    fn test_valid_password() {
        assert!(valid_password("password1"));
        assert!(valid_password("correct horse 9 battery"));

        assert!(!valid_password(""));
        assert!(!valid_password("short1"));
        assert!(!valid_password("passwordonly"));
        assert!(!valid_password("12345678"));
        assert!(!valid_password(&"a1".repeat(65)));
    }
}
