//! Admin session cookie.

use std::fmt;

use crate::config::{Environment, SessionConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// A `Set-Cookie` instruction for the admin session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age: Option<u64>,
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
}

impl SessionCookie {
    /// The cookie that makes the browser discard its admin session:
    /// same name and attributes as when issued, empty value, max-age 0.
    pub fn cleared(config: &SessionConfig, environment: Environment) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: String::new(),
            path: config.path.clone(),
            max_age: Some(0),
            http_only: true,
            same_site: SameSite::Lax,
            secure: config.secure.unwrap_or(environment.is_production()),
        }
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.path)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        write!(f, "; SameSite={}", self.same_site)?;
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}
