//! Unified error type for the stripbot application.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in stripbot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "comic", "post").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller (or the bot itself, against Bluesky) is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conflicting resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A record-store operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying store error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An upstream HTTP call (Bluesky, GoComics, S3) failed.
    #[error("HTTP error [{service}]: {message}")]
    Http {
        /// Name of the remote service that failed.
        service: String,
        /// Human-readable error description.
        message: String,
    },

    /// The comic page could not be parsed into a strip.
    #[error("Scrape error: {0}")]
    Scrape(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Unauthorized(_) => 401,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Http { .. } => 502,
            Error::Scrape(_) => 422,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Http`].
    pub fn http(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Http {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("comic", "2024-01-15");
        assert_eq!(err.to_string(), "comic not found: 2024-01-15");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn unauthorized_display() {
        let err = Error::Unauthorized("bad app password".into());
        assert_eq!(err.to_string(), "Unauthorized: bad app password");
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn validation_display() {
        let err = Error::Validation("invalid date".into());
        assert_eq!(err.to_string(), "Validation error: invalid date");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn conflict_display() {
        let err = Error::Conflict("comic already posted".into());
        assert_eq!(err.to_string(), "Conflict: comic already posted");
        assert_eq!(err.http_status(), 409);
    }

    #[test]
    fn database_display() {
        let err = Error::database("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn http_display() {
        let err = Error::http("bluesky", "status 503");
        assert_eq!(err.to_string(), "HTTP error [bluesky]: status 503");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn scrape_display() {
        let err = Error::Scrape("no og:image tag".into());
        assert_eq!(err.to_string(), "Scrape error: no og:image tag");
        assert_eq!(err.http_status(), 422);
    }

    #[test]
    fn internal_display() {
        let err = Error::Internal("unexpected state".into());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(Error::Internal("boom".into()))
        }
        assert!(err_fn().is_err());
    }
}
