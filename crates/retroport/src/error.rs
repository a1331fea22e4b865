//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use retroport_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Setup ────────────────────────────────────────────────────────

    #[error("Port forwarding setup failed")]
    #[diagnostic(
        code(retroport::setup_failed),
        help("{message}")
    )]
    SetupFailed { message: String },

    // ── Credentials ──────────────────────────────────────────────────

    #[error("No router password available for profile '{profile}'")]
    #[diagnostic(
        code(retroport::no_credentials),
        help(
            "Pass --password-env VAR, set RETROPORT_PASSWORD, or store one with:\n\
             retroport config set-password --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    #[error("Environment variable '{var}' is not set")]
    #[diagnostic(
        code(retroport::missing_env),
        help("Export the router password in {var}, or drop --password-env to be prompted.")
    )]
    MissingEnv { var: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(retroport::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: retroport config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(retroport::config))]
    Config(ConfigError),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(retroport::validation))]
    Validation { field: String, reason: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(see retroport config show)".into(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCredentials { .. } | Self::MissingEnv { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_exit_codes() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "home".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = CliError::from(ConfigError::Validation {
            field: "admin_url".into(),
            reason: "bad".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn setup_failure_is_general() {
        let err = CliError::SetupFailed {
            message: "Unsupported router type: X".into(),
        };
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
