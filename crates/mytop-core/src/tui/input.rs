//! Session id capture.

use super::mode::Mode;
use crate::error::ConsoleError;

/// Label shown in front of the captured text.
pub const INPUT_LABEL: &str = "Thread Id: ";

/// Text typed in the bottom panel while a session id is awaited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    valid: bool,
    requested_by: Option<Mode>,
}

impl InputBuffer {
    /// Starts a capture for `mode`, discarding any previous text.
    pub fn activate(&mut self, mode: Mode) {
        self.clear();
        self.requested_by = Some(mode);
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
        self.valid = validate_session_id(&self.text).is_ok();
    }

    pub fn pop(&mut self) {
        self.text.pop();
        self.valid = validate_session_id(&self.text).is_ok();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn requested_by(&self) -> Option<Mode> {
        self.requested_by
    }

    /// Validates the whole buffer and resets it.
    pub fn submit(&mut self) -> Result<String, ConsoleError> {
        let text = std::mem::take(&mut self.text);
        self.clear();
        validate_session_id(&text)?;
        Ok(text)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.valid = false;
        self.requested_by = None;
    }
}

/// Accepts a non-empty string of ASCII digits, unchanged.
pub fn validate_session_id(text: &str) -> Result<(), ConsoleError> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ConsoleError::Validation(text.to_string()))
    }
}
