use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind each session token.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Deserialize)]
pub struct LoginAttempt {
    username: String,
    password: String,
}

/// Opaque bearer token handed out on login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

pub struct Bearer(SessionToken);

impl LoginAttempt {
    #[cfg(test)]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.username
    }

    pub fn pass(&self) -> &str {
        &self.password
    }
}

impl SessionToken {
    pub fn new() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().gen();

        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // enough to correlate log lines, not enough to replay
        let prefix: String = self.as_str().chars().take(6).collect();
        write!(fmt, "{prefix}...")
    }
}

impl FromStr for Bearer {
    type Err = &'static str;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or("no space in auth header")?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err("only bearer auth supported");
        }

        let token = token.trim();
        if token.is_empty() {
            return Err("empty bearer token");
        }

        Ok(Self(token.into()))
    }
}

impl Bearer {
    pub fn into_token(self) -> SessionToken {
        self.0
    }
}

/// Pulls the session token out of an `Authorization` header, if there is one.
///
/// Anything other than a well-formed bearer credential counts as anonymous.
pub fn bearer_token(header: &str) -> Option<SessionToken> {
    match header.parse::<Bearer>() {
        Ok(bearer) => Some(bearer.into_token()),
        Err(e) => {
            trace!("ignoring authorization header: {e}");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bearer() {
        let token = bearer_token("Bearer abc-123_XYZ").unwrap();
        assert_eq!(token.as_str(), "abc-123_XYZ");

        let token = bearer_token("bearer   spaced ").unwrap();
        assert_eq!(token.as_str(), "spaced");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(bearer_token("Basic dXNlcjpwYXNz").is_none());
        assert!(bearer_token("Bearer").is_none());
        assert!(bearer_token("Bearer    ").is_none());
        assert!(bearer_token("").is_none());
    }

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = SessionToken::new();
        let b = SessionToken::new();

        // 32 bytes, unpadded base64
        assert_eq!(a.as_str().len(), 43);
        assert_ne!(a, b);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn display_hides_most_of_token() {
        let token = SessionToken::from("abcdefghijklmnop");
        assert_eq!(token.to_string(), "abcdef...");
    }
}
