//! Nickname validation for security and wire-protocol compatibility.

use thiserror::Error;

use crate::game::codec::NICKNAME_MAX_LEN;

/// Nickname validation errors with helpful messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NicknameError {
    #[error("nickname cannot be empty")]
    Empty,
    #[error("nickname is too long (maximum {max} bytes)")]
    TooLong { max: usize },
    #[error("nickname contains control characters")]
    ControlCharacters,
}

/// Validate a nickname against the protocol's fixed bootstrap frame.
pub fn validate_nickname(name: &str) -> Result<(), NicknameError> {
    if name.is_empty() {
        return Err(NicknameError::Empty);
    }
    if name.len() > NICKNAME_MAX_LEN {
        return Err(NicknameError::TooLong {
            max: NICKNAME_MAX_LEN,
        });
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(NicknameError::ControlCharacters);
    }
    Ok(())
}
