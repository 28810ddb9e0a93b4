use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Workspace-level error carried up to the binary.
///
/// Library crates keep their own typed errors; they get wrapped here at the
/// CLI boundary with [`Error::with_source`] so the chain stays printable.
#[derive(thiserror::Error)]
#[error("{msg}")]
pub struct Error {
    msg: String,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    pub fn new(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
            source: None,
        }
    }

    pub fn with_source(msg: &str, source: BoxError) -> Self {
        Self {
            msg: msg.to_string(),
            source: Some(source),
        }
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Message followed by every source in the chain, `: ` separated.
    pub fn chain(&self) -> String {
        let mut out = self.msg.clone();
        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            out.push_str(": ");
            out.push_str(&err.to_string());
            current = err.source();
        }
        out
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chain())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source("I/O error", Box::new(err))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::with_source("Configuration error", Box::new(err))
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Error::with_source("Logger setup failed", Box::new(err))
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::new(msg)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::new(&msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err = Error::with_source("Cannot load config", Box::new(io));
        assert_eq!(err.to_string(), "Cannot load config");
        assert_eq!(err.chain(), "Cannot load config: missing.toml");
    }
}
