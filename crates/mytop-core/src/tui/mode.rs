//! Console modes.

use crate::models::ExplainFormat;

/// Active view of the console. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    MainList,
    Help,
    ThreadDetail,
    EngineStatus,
    MemoryStatus,
    Replication,
    ErrorLog,
    Locking,
    ExplainNormal,
    ExplainTree,
    ExplainJson,
    ExplainAnalyze,
    Kill,
}

/// Server-wide views refreshed on every sampler update while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubView {
    Memory,
    Replication,
    Engine,
    ErrorLog,
}

impl SubView {
    pub fn mode(self) -> Mode {
        match self {
            SubView::Memory => Mode::MemoryStatus,
            SubView::Replication => Mode::Replication,
            SubView::Engine => Mode::EngineStatus,
            SubView::ErrorLog => Mode::ErrorLog,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SubView::Memory => "Memory",
            SubView::Replication => "Replication",
            SubView::Engine => "InnoDB Engine Status",
            SubView::ErrorLog => "Error Log",
        }
    }
}

impl Mode {
    /// Sub-view shown in this mode, if it is one.
    pub fn sub_view(self) -> Option<SubView> {
        match self {
            Mode::MemoryStatus => Some(SubView::Memory),
            Mode::Replication => Some(SubView::Replication),
            Mode::EngineStatus => Some(SubView::Engine),
            Mode::ErrorLog => Some(SubView::ErrorLog),
            _ => None,
        }
    }

    pub fn explain_format(self) -> Option<ExplainFormat> {
        match self {
            Mode::ExplainNormal => Some(ExplainFormat::Normal),
            Mode::ExplainTree => Some(ExplainFormat::Tree),
            Mode::ExplainJson => Some(ExplainFormat::Json),
            Mode::ExplainAnalyze => Some(ExplainFormat::Analyze),
            _ => None,
        }
    }

    pub const fn for_explain(format: ExplainFormat) -> Mode {
        match format {
            ExplainFormat::Normal => Mode::ExplainNormal,
            ExplainFormat::Tree => Mode::ExplainTree,
            ExplainFormat::Json => Mode::ExplainJson,
            ExplainFormat::Analyze | ExplainFormat::AnalyzeNoTimeout => Mode::ExplainAnalyze,
        }
    }

    pub fn is_explain(self) -> bool {
        self.explain_format().is_some()
    }
}
