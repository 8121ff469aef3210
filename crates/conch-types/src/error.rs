//! Error types for conch.

use std::io;

/// Errors produced by the conch shell engine.
#[derive(Debug, thiserror::Error)]
pub enum ConchError {
    /// A required argument was missing or empty.
    #[error("argument error: {0}")]
    Argument(String),

    /// An argument was present but of the wrong kind.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// No command is registered under the given name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// An input request is already outstanding.
    #[error("an input request is already pending")]
    InputPending,

    /// The shell was closed before the pending input was delivered.
    #[error("input closed before a line was delivered")]
    InputClosed,

    /// The local task pool refused a task.
    #[error("spawn error: {0}")]
    Spawn(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_error_display() {
        let e = ConchError::Argument("command name required".into());
        assert_eq!(format!("{e}"), "argument error: command name required");
    }

    #[test]
    fn type_mismatch_display() {
        let e = ConchError::TypeMismatch("expected hex color".into());
        assert_eq!(format!("{e}"), "type mismatch: expected hex color");
    }

    #[test]
    fn unknown_command_display() {
        let e = ConchError::UnknownCommand("frobnicate".into());
        assert_eq!(format!("{e}"), "unknown command: frobnicate");
    }

    #[test]
    fn input_errors_display() {
        assert_eq!(
            ConchError::InputPending.to_string(),
            "an input request is already pending"
        );
        assert_eq!(
            ConchError::InputClosed.to_string(),
            "input closed before a line was delivered"
        );
    }

    #[test]
    fn io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let e: ConchError = io_err.into();
        assert!(matches!(e, ConchError::Io(_)));
        assert!(e.to_string().contains("missing"));
    }

    #[test]
    fn toml_error_from() {
        let bad: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let e: ConchError = bad.unwrap_err().into();
        assert!(matches!(e, ConchError::TomlParse(_)));
    }

    #[test]
    fn json_error_from() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let e: ConchError = bad.unwrap_err().into();
        assert!(matches!(e, ConchError::Json(_)));
    }

    #[test]
    fn result_alias_works() {
        fn returns_ok() -> Result<u32> {
            Ok(7)
        }
        fn returns_err() -> Result<u32> {
            Err(ConchError::Config("bad".into()))
        }
        assert_eq!(returns_ok().unwrap(), 7);
        assert!(returns_err().is_err());
    }
}
