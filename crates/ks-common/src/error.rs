use std::fmt;

use serde::Serialize;

use crate::location::Location;

/// A family of error kinds.
///
/// `name` is the stable identifier shown to users and used as the
/// diagnostic code. `description` is a message template where `{key}`
/// placeholders are replaced by the error's arguments.
pub trait ErrorCode: fmt::Debug + Clone + Copy + PartialEq + Eq {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
}

/// An error value: a code, an optional location and the named arguments
/// used to fill in the code's description template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Error<C> {
    pub code: C,
    pub location: Option<Location>,
    pub arguments: Vec<(&'static str, String)>,
}

impl<C: ErrorCode> Error<C> {
    pub fn new(code: C, location: Option<Location>) -> Self {
        Self {
            code,
            location,
            arguments: Vec::new(),
        }
    }

    /// Attach a named argument. Later arguments with the same key shadow
    /// earlier ones when the message is rendered.
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.arguments.retain(|(k, _)| *k != key);
        self.arguments.push((key, value.to_string()));
        self
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The description template with every argument interpolated, without
    /// the code name prefix.
    pub fn message(&self) -> String {
        self.arguments
            .iter()
            .fold(self.code.description().to_string(), |message, (key, value)| {
                message.replace(&format!("{{{key}}}"), value)
            })
    }
}

impl<C: ErrorCode> fmt::Display for Error<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.name(), self.message())
    }
}

impl<C: ErrorCode> std::error::Error for Error<C> {}
