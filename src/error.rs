use std::fmt;

/// Errors that escalate out of the sanitization engine.
///
/// Routine rejections of untrusted input are never errors: they come back as
/// [`SanitizedValue::Rejected`](crate::SanitizedValue::Rejected). Only the
/// cases below are surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A date string could not be parsed by [`safe_str_to_time`](crate::safe_str_to_time).
    DateParse {
        /// The string that failed to parse
        input: String,
    },
    /// The character encoding of a raw byte payload could not be detected.
    ///
    /// This is unrecoverable for the request that produced it: the payload
    /// must be discarded rather than processed with a guessed encoding.
    Encoding,
    /// A JSON payload could not be decoded into a flat field mapping.
    Json {
        /// Decoder message (never contains the payload itself)
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DateParse { input } => write!(f, "can't parse date: {}", input),
            Error::Encoding => write!(f, "character encoding detection failed"),
            Error::Json { message } => write!(f, "invalid JSON input: {}", message),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failure() {
        let err = Error::DateParse {
            input: "bogus date here.".to_string(),
        };
        assert_eq!(err.to_string(), "can't parse date: bogus date here.");
        assert_eq!(
            Error::Encoding.to_string(),
            "character encoding detection failed"
        );
    }

    #[test]
    fn json_errors_convert() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().starts_with("invalid JSON input"));
    }
}
