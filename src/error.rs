//! Error types for flattening, restoring and header transport.
//!
//! The flattener and restorer themselves never fail on odd input: unknown
//! classes and dangling references degrade to the raw node. Errors only come
//! from the edges of the crate:
//!
//! - **JSON**: the text handed to [`decode`](crate::decode) is not valid JSON
//! - **Transport**: header chunks are missing, not base64, or not UTF-8
//! - **Serde bridges**: [`to_value`](crate::to_value) and
//!   [`from_value`](crate::from_value) met a shape they cannot express
//!
//! ## Examples
//!
//! ```rust
//! use firepickle::{decode, Error};
//!
//! let result = decode("{\"unterminated\": ");
//! assert!(matches!(result, Err(Error::Json(_))));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all errors surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The input was not valid JSON, or JSON text could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A header chunk was not valid base64.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Reassembled header data was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A header sequence skipped an index.
    #[error("missing header chunk {index} of guid {guid}")]
    MissingChunk { guid: String, index: usize },

    /// Unsupported shape for the serde bridges.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),

    /// Generic message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates an error for a header sequence with a gap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::Error;
    ///
    /// let err = Error::missing_chunk("0badf00d", 2);
    /// assert!(err.to_string().contains("chunk 2"));
    /// ```
    pub fn missing_chunk(guid: &str, index: usize) -> Self {
        Error::MissingChunk {
            guid: guid.to_string(),
            index,
        }
    }

    /// Creates an unsupported type error for shapes the serde bridges cannot map.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
