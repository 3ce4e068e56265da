use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Writing the finished receipt failed.
    Io(std::io::Error),
    /// The record input was not a JSON object.
    InvalidRecord {
        source: Option<serde_json::Error>,
        hint: String,
    },
    /// Text could not be measured with the requested style.
    Measurement(String),
    /// A font that was explicitly requested could not be loaded.
    Font(String),
    /// The laid-out canvas could not be serialized into a PDF.
    Serialization {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub(crate) fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization {
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidRecord { source, hint } => {
                match source {
                    Some(e) => write!(f, "Invalid record: {e}")?,
                    None => write!(f, "Invalid record")?,
                }
                if !hint.is_empty() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            Error::Measurement(msg) => write!(f, "Text measurement failed: {msg}"),
            Error::Font(msg) => write!(f, "Font error: {msg}"),
            Error::Serialization { message, source } => {
                write!(f, "Receipt generation failed: {message}")?;
                if let Some(e) = source {
                    write!(f, " ({e})")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::InvalidRecord {
                source: Some(e), ..
            } => Some(e),
            Error::Serialization {
                source: Some(e), ..
            } => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but is not a record object.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input.".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        Error::InvalidRecord {
            source: Some(e),
            hint,
        }
    }
}
