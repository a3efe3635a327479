//! Process exit codes
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | Failure: source, render or configuration error |
//! | 2 | Not authenticated: missing or rejected credentials, expired session |

use std::process;

/// Exit code for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    Unauthenticated = 2,
}

impl ExitCode {
    /// Check if this represents success
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get the numeric value
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
        assert_eq!(ExitCode::Unauthenticated.code(), 2);
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::Unauthenticated.is_success());
    }
}
