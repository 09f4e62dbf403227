//! Key transition table.
//!
//! Each row maps a key, under a guard on the current mode, to an action and
//! the mode entered when the action succeeds. The controller takes the first
//! matching row; keys without a row are ignored.

use super::event::Key;
use super::mode::{Mode, SubView};
use crate::models::ExplainFormat;

/// Condition on the controller state for a row to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Any,
    /// Main list, not awaiting input.
    MainList,
    /// Any other mode, not awaiting input.
    NotMain,
    /// Exactly this mode, not awaiting input.
    In(Mode),
    /// An explain view other than `ExplainAnalyze`.
    ExplainBeforeAnalyze,
    /// A session id is being typed.
    AwaitingInput,
}

impl Guard {
    pub fn allows(self, mode: Mode, awaiting_input: bool) -> bool {
        match self {
            Guard::Any => true,
            Guard::AwaitingInput => awaiting_input,
            _ if awaiting_input => false,
            Guard::MainList => mode == Mode::MainList,
            Guard::NotMain => mode != Mode::MainList,
            Guard::In(m) => mode == m,
            Guard::ExplainBeforeAnalyze => mode.is_explain() && mode != Mode::ExplainAnalyze,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ShowHelp,
    OpenSubView(SubView),
    /// Starts capturing a session id for the next mode.
    RequestInput { suspend_sampling: bool },
    Submit,
    Back,
    Explain(ExplainFormat),
    Redraw,
    Analyze { bounded: bool },
    Scroll(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub key: Key,
    pub guard: Guard,
    pub action: Action,
    /// Mode entered on success; `None` keeps or lets the action decide.
    pub next: Option<Mode>,
}

const fn row(key: Key, guard: Guard, action: Action, next: Option<Mode>) -> Transition {
    Transition {
        key,
        guard,
        action,
        next,
    }
}

/// Space in an explain view shows the next format of the cycle.
const fn space(from: ExplainFormat) -> Transition {
    let to = from.cycle();
    row(
        Key::Char(' '),
        Guard::In(Mode::for_explain(from)),
        Action::Explain(to),
        Some(Mode::for_explain(to)),
    )
}

const PAGE: i32 = 10;

#[rustfmt::skip]
pub const TRANSITIONS: &[Transition] = &[
    row(Key::Esc, Guard::Any, Action::Quit, None),
    row(Key::CtrlC, Guard::Any, Action::Quit, None),
    row(Key::Enter, Guard::AwaitingInput, Action::Submit, None),
    row(Key::Char('?'), Guard::Any, Action::ShowHelp, Some(Mode::Help)),
    row(Key::Char('m'), Guard::Any, Action::OpenSubView(SubView::Memory), Some(Mode::MemoryStatus)),
    row(Key::Char('M'), Guard::Any, Action::OpenSubView(SubView::Memory), Some(Mode::MemoryStatus)),
    row(Key::Char('r'), Guard::Any, Action::OpenSubView(SubView::Replication), Some(Mode::Replication)),
    row(Key::Char('R'), Guard::Any, Action::OpenSubView(SubView::Replication), Some(Mode::Replication)),
    row(Key::Char('i'), Guard::Any, Action::OpenSubView(SubView::Engine), Some(Mode::EngineStatus)),
    row(Key::Char('I'), Guard::Any, Action::OpenSubView(SubView::Engine), Some(Mode::EngineStatus)),
    row(Key::Char('E'), Guard::Any, Action::OpenSubView(SubView::ErrorLog), Some(Mode::ErrorLog)),
    row(Key::Char('l'), Guard::MainList, Action::RequestInput { suspend_sampling: false }, Some(Mode::Locking)),
    row(Key::Char('L'), Guard::MainList, Action::RequestInput { suspend_sampling: false }, Some(Mode::Locking)),
    row(Key::Char('e'), Guard::MainList, Action::RequestInput { suspend_sampling: false }, Some(Mode::ExplainNormal)),
    row(Key::Char('d'), Guard::MainList, Action::RequestInput { suspend_sampling: true }, Some(Mode::ThreadDetail)),
    row(Key::Char('D'), Guard::MainList, Action::RequestInput { suspend_sampling: true }, Some(Mode::ThreadDetail)),
    row(Key::Char('k'), Guard::MainList, Action::RequestInput { suspend_sampling: false }, Some(Mode::Kill)),
    row(Key::Char('K'), Guard::MainList, Action::RequestInput { suspend_sampling: false }, Some(Mode::Kill)),
    row(Key::Backspace, Guard::NotMain, Action::Back, Some(Mode::MainList)),
    space(ExplainFormat::Normal),
    space(ExplainFormat::Tree),
    space(ExplainFormat::Json),
    row(Key::Char(' '), Guard::MainList, Action::Redraw, None),
    row(Key::Char('a'), Guard::ExplainBeforeAnalyze, Action::Analyze { bounded: true }, Some(Mode::ExplainAnalyze)),
    row(Key::Char('A'), Guard::ExplainBeforeAnalyze, Action::Analyze { bounded: false }, Some(Mode::ExplainAnalyze)),
    row(Key::Up, Guard::NotMain, Action::Scroll(-1), None),
    row(Key::Down, Guard::NotMain, Action::Scroll(1), None),
    row(Key::PageUp, Guard::NotMain, Action::Scroll(-PAGE), None),
    row(Key::PageDown, Guard::NotMain, Action::Scroll(PAGE), None),
];

/// First row matching `key` in the given state.
pub fn lookup(key: Key, mode: Mode, awaiting_input: bool) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|t| t.key == key && t.guard.allows(mode, awaiting_input))
}
