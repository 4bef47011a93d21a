//! Password credential type.
//!
//! Passwords are opaque strings compared verbatim against the stored
//! value. The wrapper keeps them out of `Debug` output and log lines.

use secrecy::{ExposeSecret, SecretString};

/// A user password.
///
/// `Debug` prints a redacted placeholder, so a `Password` can sit inside
/// structs that get logged.
#[derive(Clone)]
pub struct Password(SecretString);

impl Password {
    /// Wrap a raw password string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// Compare against a stored credential, byte for byte.
    #[must_use]
    pub fn matches(&self, stored: &str) -> bool {
        self.0.expose_secret() == stored
    }

    /// Expose the raw value for storage.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl From<&str> for Password {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Password {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_verbatim() {
        let password = Password::new("pw1");
        assert!(password.matches("pw1"));
        assert!(!password.matches("pw1 "));
        assert!(!password.matches("PW1"));
    }

    #[test]
    fn test_debug_redacts() {
        let password = Password::new("hunter2");
        let debug = format!("{password:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
