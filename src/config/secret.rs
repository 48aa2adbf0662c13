//! Credential handling using the secrecy crate
//!
//! Export passwords pass through Courier opaquely: they are read from the
//! configuration, the environment or the project document, placed in the
//! job spec and sent to the export engine. Holding them in a
//! [`SecretString`] zeroes the memory on drop and keeps them out of `Debug`
//! output and logs.
//!
//! # Example
//!
//! ```rust
//! use courier::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let password = secret_string("s3cret".to_string());
//! assert_eq!(password.expose_secret(), "s3cret");
//! assert!(!format!("{password:?}").contains("s3cret"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload of a [`SecretString`]
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

// The job spec must carry the password to the export engine.
impl SerializableSecret for SecretValue {}

impl SecretValue {
    /// Whether the secret is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A string that is zeroized on drop and redacted in `Debug`
pub type SecretString = Secret<SecretValue>;

/// Wrap a string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Wrap an optional string; blank values become `None`
///
/// ```rust
/// use courier::config::secret_string_opt;
///
/// assert!(secret_string_opt(Some("pw".to_string())).is_some());
/// assert!(secret_string_opt(Some("  ".to_string())).is_none());
/// assert!(secret_string_opt(None).is_none());
/// ```
#[inline]
pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(secret_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("export-password".to_string());
        assert_eq!(secret.expose_secret(), "export-password");
    }

    #[test]
    fn test_secret_string_opt_blank() {
        assert!(secret_string_opt(Some(String::new())).is_none());
        let secret = secret_string_opt(Some("pw".to_string())).unwrap();
        assert_eq!(secret.expose_secret(), "pw");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-data".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-data"));
        assert!(debug_output.contains("REDACTED"));
    }

    #[test]
    fn test_secret_serde_round_trip() {
        use serde::{Deserialize, Serialize};

        #[derive(Serialize, Deserialize)]
        struct Credentials {
            password: SecretString,
        }

        let creds = Credentials {
            password: secret_string("test123".to_string()),
        };

        let json = serde_json::to_string(&creds).unwrap();
        assert_eq!(json, r#"{"password":"test123"}"#);

        let parsed: Credentials = toml::from_str("password = \"from-toml\"").unwrap();
        assert_eq!(parsed.password.expose_secret(), "from-toml");
    }
}
