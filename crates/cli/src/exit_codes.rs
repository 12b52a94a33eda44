//! CLI Exit Code Registry
//!
//! Single source of truth for `carjoin` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args, missing file)           |
//! | 3    | Invalid join config                                |
//! | 4    | Target table could not be read or written back     |
//! | 5    | Reference data could not be loaded                 |
//! | 6    | Reference load exceeded `timeout_secs`             |
//! | 7    | Zero enriched rows and `--fail-on-empty` was given |

use carjoin_recon::JoinError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing config file.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Target CSV unreadable, missing a mapped column, or output not writable.
pub const EXIT_TARGET_IO: u8 = 4;

/// Reference source unreachable, non-2xx, or malformed.
pub const EXIT_REFERENCE_LOAD: u8 = 5;

/// Reference source did not answer within `reference.timeout_secs`.
pub const EXIT_REFERENCE_TIMEOUT: u8 = 6;

/// The join produced no rows (only with `--fail-on-empty`).
pub const EXIT_EMPTY: u8 = 7;

/// Which input a failure came from. The same `JoinError` variant maps to a
/// different code depending on the side that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Target,
    Reference,
    Join,
}

/// Map an engine error to its exit code.
pub fn join_exit_code(err: &JoinError, stage: Stage) -> u8 {
    match (err, stage) {
        (JoinError::ConfigParse(_) | JoinError::ConfigValidation(_), _) => EXIT_INVALID_CONFIG,
        (JoinError::LoadTimeout { .. }, _) => EXIT_REFERENCE_TIMEOUT,
        (JoinError::ReferenceLoad(_), _) => EXIT_REFERENCE_LOAD,
        (_, Stage::Reference) => EXIT_REFERENCE_LOAD,
        (_, Stage::Target) => EXIT_TARGET_IO,
        (_, Stage::Config) => EXIT_INVALID_CONFIG,
        (_, Stage::Join) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_code_depends_on_side() {
        let err = JoinError::MissingColumn { table: "x".into(), column: "price".into() };
        assert_eq!(join_exit_code(&err, Stage::Target), EXIT_TARGET_IO);
        assert_eq!(join_exit_code(&err, Stage::Reference), EXIT_REFERENCE_LOAD);
    }

    #[test]
    fn timeout_wins_over_stage() {
        let err = JoinError::LoadTimeout { source: "kbb".into(), seconds: 1 };
        assert_eq!(join_exit_code(&err, Stage::Reference), EXIT_REFERENCE_TIMEOUT);
    }

    #[test]
    fn config_errors() {
        let err = JoinError::ConfigValidation("cutoff".into());
        assert_eq!(join_exit_code(&err, Stage::Join), EXIT_INVALID_CONFIG);
    }
}
