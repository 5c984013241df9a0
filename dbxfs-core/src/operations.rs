//! Operation options

use crate::error::{DbxError, DbxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a copy batch does when a single remote call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Propagate the failure and abort the rest of the batch.
    Raise,
    /// Report the failure and continue with the next instruction.
    Ignore,
}

impl ErrorPolicy {
    /// `Ignore` for recursive copies, `Raise` otherwise.
    pub fn default_for(recursive: bool) -> Self {
        if recursive {
            ErrorPolicy::Ignore
        } else {
            ErrorPolicy::Raise
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = DbxError;

    fn from_str(s: &str) -> DbxResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raise" => Ok(ErrorPolicy::Raise),
            "ignore" => Ok(ErrorPolicy::Ignore),
            other => Err(DbxError::Other(format!("unknown error policy: {other}"))),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Raise => write!(f, "raise"),
            ErrorPolicy::Ignore => write!(f, "ignore"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyOptions {
    pub recursive: bool,
    pub on_error: Option<ErrorPolicy>,
}

impl CopyOptions {
    pub fn recursive() -> Self {
        Self { recursive: true, on_error: None }
    }

    pub fn with_on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = Some(policy);
        self
    }

    pub fn effective_policy(&self) -> ErrorPolicy {
        self.on_error.unwrap_or_else(|| ErrorPolicy::default_for(self.recursive))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOptions {
    pub recursive: bool,
    pub detail: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self { recursive: true, detail: true }
    }
}

/// How a remote file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

impl OpenMode {
    pub fn is_write(&self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

impl FromStr for OpenMode {
    type Err = DbxError;

    fn from_str(s: &str) -> DbxResult<Self> {
        match s {
            "r" | "rb" => Ok(OpenMode::Read),
            "w" | "wb" => Ok(OpenMode::Write),
            "a" | "ab" => Ok(OpenMode::Append),
            other => Err(DbxError::InvalidMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_by_recursion() {
        assert_eq!(ErrorPolicy::default_for(true), ErrorPolicy::Ignore);
        assert_eq!(ErrorPolicy::default_for(false), ErrorPolicy::Raise);

        assert_eq!(CopyOptions::default().effective_policy(), ErrorPolicy::Raise);
        assert_eq!(CopyOptions::recursive().effective_policy(), ErrorPolicy::Ignore);
    }

    #[test]
    fn test_explicit_policy_wins() {
        let opts = CopyOptions::recursive().with_on_error(ErrorPolicy::Raise);
        assert_eq!(opts.effective_policy(), ErrorPolicy::Raise);

        let opts = CopyOptions::default().with_on_error(ErrorPolicy::Ignore);
        assert_eq!(opts.effective_policy(), ErrorPolicy::Ignore);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("raise".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Raise);
        assert_eq!("IGNORE".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Ignore);
        assert!("skip".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_open_mode_parse() {
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert_eq!("ab".parse::<OpenMode>().unwrap(), OpenMode::Append);
        assert!(matches!("r+".parse::<OpenMode>(), Err(DbxError::InvalidMode(_))));
    }
}
