//! This module contains all custom errors used in this library.

use std::fmt;
use std::error::Error;

#[derive(Debug)]
pub enum ImportError {
    IoError(std::io::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> ImportError {
        ImportError::IoError(e)
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "Import: IoError ({})", e),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProcessingError {
    InvalidParameter(String),
    /// The strategy search visited more states than the configured budget allows.
    BudgetExhausted(usize),
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Self::BudgetExhausted(n) => write!(f, "Search budget of {} states exhausted", n),
        }
    }
}

impl Error for ProcessingError {}
