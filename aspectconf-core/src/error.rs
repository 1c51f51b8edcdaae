//! Error types for the configuration engine

use crate::value::ValueError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Property is write protected: {0}")]
    WriteProtected(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Cannot convert {from} to {to} for property '{property}': {reason}")]
    Conversion {
        property: String,
        from: String,
        to: String,
        reason: String,
    },

    #[error("Failed to initialize property '{property}': {source}")]
    Initialization {
        property: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid contract: {0}")]
    InvalidContract(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Attach the property name to a value-level conversion failure
    pub fn conversion(property: &str, err: ValueError) -> Self {
        match err {
            ValueError::Conversion { from, to, reason } => Error::Conversion {
                property: property.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                reason,
            },
            ValueError::OutOfRange { value, target } => Error::Conversion {
                property: property.to_string(),
                from: value,
                to: target.to_string(),
                reason: "out of range".to_string(),
            },
        }
    }

    pub fn initialization(property: &str, source: Error) -> Self {
        Error::Initialization {
            property: property.to_string(),
            source: Box::new(source),
        }
    }

    /// Property the error refers to, if any
    pub fn property(&self) -> Option<&str> {
        match self {
            Error::UnknownProperty(name) | Error::WriteProtected(name) => Some(name),
            Error::Conversion { property, .. } | Error::Initialization { property, .. } => {
                Some(property)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
