//! WebSocket extension declarations (RFC 6455 Section 9).
//!
//! An [`Extension`] is what a client offers in `Sec-WebSocket-Extensions`
//! and what the server hands back once negotiated:
//! `permessage-deflate; client_max_window_bits=15; server_no_context_takeover`.
//! Applying an extension to frames is the transport engine's business.

use std::fmt;

use crate::error::{Error, Result};

/// A single extension parameter, with or without a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionParameter {
    /// Parameter name (e.g., "client_max_window_bits").
    pub name: String,
    /// Parameter value. `None` for flag parameters.
    pub value: Option<String>,
}

impl ExtensionParameter {
    /// Create a parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create a flag parameter.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Parse `name=value`, `name="value"` or `name`.
    fn parse(s: &str) -> Self {
        match s.trim().split_once('=') {
            Some((name, value)) => Self::new(name.trim(), value.trim().trim_matches('"')),
            None => Self::flag(s.trim()),
        }
    }
}

impl fmt::Display for ExtensionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A named extension with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extension {
    name: String,
    parameters: Vec<ExtensionParameter>,
}

impl Extension {
    /// Create an extension without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a `name=value` parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(ExtensionParameter::new(name, value));
        self
    }

    /// Add a flag parameter.
    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ExtensionParameter::flag(name));
        self
    }

    /// Extension name as it appears on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ExtensionParameter] {
        &self.parameters
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ExtensionParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Parse one `name; param=value; flag` element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if the extension name is empty.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(Error::InvalidExtension(format!(
                "Empty extension name in {:?}",
                s
            )));
        }

        Ok(Self {
            name: name.to_string(),
            parameters: parts
                .filter(|p| !p.trim().is_empty())
                .map(ExtensionParameter::parse)
                .collect(),
        })
    }

    /// Parse every element of one or more `Sec-WebSocket-Extensions` header values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if any element is invalid.
    pub fn parse_header<'a, I>(values: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values
            .into_iter()
            .flat_map(|value| value.split(','))
            .filter(|element| !element.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Render a list of extensions as a single header value.
    #[must_use]
    pub fn to_header_value(extensions: &[Extension]) -> String {
        extensions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for parameter in &self.parameters {
            write!(f, "; {}", parameter)?;
        }
        Ok(())
    }
}
