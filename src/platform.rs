use std::process;

use crate::error::ProfileError;

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }

    /// Usage mistakes exit with 2, every other failure with 1
    pub fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<ProfileError>() {
            Some(e) if e.is_configuration() => ExitCode::InvalidUsage,
            _ => ExitCode::GeneralError,
        }
    }
}
