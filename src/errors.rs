use std::{fmt, io, str::Utf8Error};
use quick_xml::events::attributes::AttrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    /// The source document is malformed.
    Parse,
    /// A node, way or child markup item lacks a required attribute.
    MissingField,
    SchemaValidation,
    /// Writing a record to an output table failed.
    Sink,
    Config,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Parse, message)
    }

    pub fn missing_field(element: &str, id: Option<&str>, field: &str) -> Self {
        let message = match id {
            Some(id) => format!("{} {} is missing required attribute '{}'", element, id, field),
            None => format!("{} is missing required attribute '{}'", element, field),
        };
        Error::new(ErrorKind::MissingField, message)
    }

    /// A write to one of the output files failed.
    pub fn sink(message: impl fmt::Display) -> Self {
        Error::new(ErrorKind::Sink, message.to_string())
    }

    pub fn schema(element: &str, errors: &[String]) -> Self {
        Error::new(
            ErrorKind::SchemaValidation,
            format!("Element of type '{}' has the following errors:\n{}", element, errors.join("\n")),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::new(ErrorKind::Io, value.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::new(ErrorKind::Parse, value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::new(ErrorKind::Parse, value.to_string())
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::new(ErrorKind::Parse, value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::new(ErrorKind::Sink, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::new(ErrorKind::Config, value.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(value: regex::Error) -> Self {
        Error::new(ErrorKind::Config, value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
