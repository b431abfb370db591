// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// Restriction description file missing or unreadable
    FileNotFound(String),
    /// Restriction description failed to parse or validate
    Malformed(String),
    /// General error from the dpucaps library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            CliError::Malformed(msg) => write!(f, "Malformed restrictions: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::FileNotFound(_) => ExitCode::from(3),
            CliError::Malformed(_) => ExitCode::from(4),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map dpucaps::Error to CliError with appropriate exit codes
impl From<dpucaps::Error> for CliError {
    fn from(err: dpucaps::Error) -> Self {
        use dpucaps::Error;

        match err {
            Error::Malformed(err) => CliError::Malformed(err.to_string()),

            // The JSON source reports parse failures as source errors
            Error::Source(err) => CliError::Malformed(err.to_string()),

            Error::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound => CliError::FileNotFound(io_err.to_string()),
                std::io::ErrorKind::PermissionDenied => {
                    CliError::FileNotFound(format!("Permission denied: {}", io_err))
                }
                _ => CliError::General(format!("I/O error: {}", io_err)),
            },

            Error::OutOfRange { index, count } => CliError::InvalidArgs(format!(
                "special channel index {} out of range (count {})",
                index, count
            )),

            // Registry and unsupported-operation errors do not arise from a file
            other => CliError::General(other.to_string()),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpucaps::restriction::{ChannelClass, RestrictionError};

    #[test]
    fn test_library_error_mapping() {
        let err = CliError::from(dpucaps::Error::Io(std::io::Error::from(
            std::io::ErrorKind::NotFound,
        )));
        assert!(matches!(err, CliError::FileNotFound(_)));

        let err = CliError::from(dpucaps::Error::Malformed(RestrictionError::EmptyFormats {
            class: ChannelClass::General,
            id: 3,
        }));
        assert!(matches!(err, CliError::Malformed(_)));

        let err = CliError::from(dpucaps::Error::OutOfRange { index: 2, count: 1 });
        assert!(matches!(err, CliError::InvalidArgs(_)));
    }
}
