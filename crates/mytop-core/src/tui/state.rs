//! Controller state, owned and mutated by the dispatch loop only.

use super::input::InputBuffer;
use super::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub mode: Mode,
    /// Session id of the current drill-down.
    pub target: Option<String>,
    /// Sampler updates are drawn into the main panel.
    pub sampling_owns_main_view: bool,
    /// A session id is being typed for `input.requested_by()`.
    pub awaiting_input: bool,
    pub input: InputBuffer,
    /// Message shown in the bottom panel.
    pub error: Option<String>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            mode: Mode::MainList,
            target: None,
            sampling_owns_main_view: true,
            awaiting_input: false,
            input: InputBuffer::default(),
            error: None,
        }
    }
}

impl ControllerState {
    /// Returns to the main list with sampling restored. Input and target
    /// are dropped; a pending error is kept for display.
    pub fn reset_to_main(&mut self) {
        self.mode = Mode::MainList;
        self.target = None;
        self.sampling_owns_main_view = true;
        self.awaiting_input = false;
        self.input.clear();
    }
}
