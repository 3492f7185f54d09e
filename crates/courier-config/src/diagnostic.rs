// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette-backed configuration diagnostics.
//!
//! Converts Figment deserialization errors and post-deserialization
//! validation failures into diagnostics with an actionable help line.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error suitable for rendering to the operator.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Figment could not parse or merge the configuration sources.
    #[error("invalid configuration: {detail}")]
    #[diagnostic(
        code(courier::config::parse),
        help("check courier.toml against the documented sections: relay, server, storage, sessions")
    )]
    Parse {
        /// Figment's description of the failure.
        detail: String,
    },

    /// A semantic constraint failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(courier::config::validation))]
    Validation { message: String },
}

/// Convert a figment error into one `ConfigError` per underlying failure.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            detail: e.to_string(),
        })
        .collect()
}

/// Render all collected errors to stderr via miette's fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::msg(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figment_errors_become_parse_diagnostics() {
        let err = crate::loader::load_config_from_str("server = 12").unwrap_err();
        let errors = figment_to_config_errors(err);
        assert!(!errors.is_empty());
        assert!(matches!(errors[0], ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_error_displays_message() {
        let err = ConfigError::Validation {
            message: "server.port must be non-zero".into(),
        };
        assert!(err.to_string().contains("server.port"));
    }
}
