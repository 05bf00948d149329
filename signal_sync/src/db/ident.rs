//! Identifiers that have to be spliced into SQL text.
//!
//! Table, column, view and schema names cannot be bound as parameters. Every such
//! name goes through [`Ident::parse`] first: 1 to 128 characters of `[A-Za-z0-9_]`,
//! not starting with a digit. The rendered form is always double-quoted.

use std::fmt;

use thiserror::Error;

pub const MAX_IDENT_LEN: usize = 128;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier {0:?} is longer than {MAX_IDENT_LEN} characters")]
    TooLong(String),
    #[error("identifier {0:?} starts with a digit")]
    LeadingDigit(String),
    #[error("identifier {0:?} contains characters outside [A-Za-z0-9_]")]
    InvalidChar(String),
}

/// A validated SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn parse(raw: &str) -> Result<Self, IdentError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentError::Empty);
        }
        if raw.len() > MAX_IDENT_LEN {
            return Err(IdentError::TooLong(raw.to_string()));
        }
        if raw.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(IdentError::LeadingDigit(raw.to_string()));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(IdentError::InvalidChar(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// A built-in name that already satisfies the allow-list.
    pub(crate) fn trusted(name: &'static str) -> Self {
        debug_assert!(Self::parse(name).is_ok(), "{name} is not a valid identifier");
        Self(name.to_string())
    }

    /// The bare name, for binding as a value (e.g. against `sqlite_master.name`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"name"`, ready to splice into SQL.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}
