use thiserror::Error;

/// Result type alias for the document build
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document build
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A definition reference could not be built from a short type name.
    /// This aborts the whole document build.
    #[error("cannot build reference to definition {name:?}")]
    InvalidReference { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reference_message() {
        let err = Error::InvalidReference {
            name: "Foo;>".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot build reference to definition \"Foo;>\""
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }
}
