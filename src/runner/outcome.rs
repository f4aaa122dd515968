//! Per-item and per-run outcome types.
//!
//! One tagged variant per way a submission's processing can end, so the
//! pipeline is a single function returning an outcome instead of a family of
//! near-duplicate procedures.

/// How processing one submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Reviewed by the AI service and graded.
    Reviewed { score: u32 },
    /// No file attached; zero-graded with an explanatory note.
    MissingFile,
    /// A .doc/.docx upload; zero-graded with a conversion note.
    LegacyDocument,
    /// Any other extension; zero-graded with a format note.
    InvalidFormat,
    /// Processing or submission failed; files kept, item stays pending.
    Failed(String),
}

impl ItemOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemOutcome::Failed(_))
    }

    /// Short label for progress lines and the final report.
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Reviewed { .. } => "reviewed",
            ItemOutcome::MissingFile => "missing file",
            ItemOutcome::LegacyDocument => "legacy document",
            ItemOutcome::InvalidFormat => "invalid format",
            ItemOutcome::Failed(_) => "failed",
        }
    }
}

/// Terminal state of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pending set was exhausted.
    Completed,
    /// The run stopped early; the payload names what broke.
    Aborted(String),
}

impl RunOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_outcome_variants() {
        assert_eq!(ItemOutcome::Reviewed { score: 85 }, ItemOutcome::Reviewed { score: 85 });
        assert_ne!(ItemOutcome::Reviewed { score: 85 }, ItemOutcome::Reviewed { score: 70 });
        assert_ne!(ItemOutcome::MissingFile, ItemOutcome::InvalidFormat);
    }

    #[test]
    fn test_item_outcome_is_failed() {
        assert!(ItemOutcome::Failed("timeout".into()).is_failed());
        assert!(!ItemOutcome::MissingFile.is_failed());
        assert!(!ItemOutcome::Reviewed { score: 0 }.is_failed());
    }

    #[test]
    fn test_item_outcome_labels() {
        assert_eq!(ItemOutcome::Reviewed { score: 1 }.label(), "reviewed");
        assert_eq!(ItemOutcome::MissingFile.label(), "missing file");
        assert_eq!(ItemOutcome::LegacyDocument.label(), "legacy document");
        assert_eq!(ItemOutcome::InvalidFormat.label(), "invalid format");
        assert_eq!(ItemOutcome::Failed("x".into()).label(), "failed");
    }

    #[test]
    fn test_run_outcome() {
        assert!(RunOutcome::Aborted("review broken".into()).is_aborted());
        assert!(!RunOutcome::Completed.is_aborted());
    }
}
