//! Calendar credentials for CalDAV basic auth.
//!
//! Read from the `username` and `password` environment variables (Apple ID
//! and app-specific password for iCloud).

use std::fmt;

pub const USERNAME_VAR: &str = "username";
pub const PASSWORD_VAR: &str = "password";

#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// `None` when either value is empty.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(Credentials { username, password })
    }

    pub fn from_env() -> Option<Self> {
        let username = std::env::var(USERNAME_VAR).unwrap_or_default();
        let password = std::env::var(PASSWORD_VAR).unwrap_or_default();
        Self::new(username, password)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `(username, password)` for `AddAuthorization::basic`.
    pub fn basic_auth(&self) -> (&str, &str) {
        (&self.username, &self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_mean_no_credentials() {
        assert!(Credentials::new("", "secret").is_none());
        assert!(Credentials::new("ana@icloud.com", "").is_none());
        assert!(Credentials::new("ana@icloud.com", "abcd-efgh").is_some());
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("ana@icloud.com", "abcd-efgh").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("ana@icloud.com"));
        assert!(!debug.contains("abcd-efgh"));
    }
}
