//! Single-tag hold: at most one tag is in progress at any time.

use crate::errors::{AppError, AppResult};
use crate::models::tag::normalize_tag;

/// What happened on a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// IDLE → HELD.
    Loaded(String),
    /// The held tag was loaded again; nothing changed.
    Reloaded(String),
}

/// What the scan loop should do with a decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Accept(String),
    /// Another tag is held; the value is dropped.
    Ignored { value: String, held: String },
    Blank,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldState {
    current: Option<String>,
    allow_actions: bool,
}

impl HoldState {
    /// Restore a hold persisted by a previous process.
    pub fn restore(current: Option<String>) -> Self {
        let current = current.and_then(|t| normalize_tag(&t));
        let allow_actions = current.is_some();
        Self {
            current,
            allow_actions,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn allow_actions(&self) -> bool {
        self.allow_actions
    }

    /// Load `raw` as the tag in progress.
    pub fn load(&mut self, raw: &str) -> AppResult<LoadOutcome> {
        let tag = normalize_tag(raw)
            .ok_or_else(|| AppError::Validation("tag identifier is empty".into()))?;

        match &self.current {
            Some(held) if *held != tag => Err(AppError::HoldConflict { held: held.clone() }),
            Some(_) => {
                self.allow_actions = true;
                Ok(LoadOutcome::Reloaded(tag))
            }
            None => {
                self.current = Some(tag.clone());
                self.allow_actions = true;
                Ok(LoadOutcome::Loaded(tag))
            }
        }
    }

    /// Hold check for a value coming from the capture loop.
    pub fn check_scan(&self, raw: &str) -> ScanVerdict {
        let Some(value) = normalize_tag(raw) else {
            return ScanVerdict::Blank;
        };
        match &self.current {
            Some(held) if *held != value => ScanVerdict::Ignored {
                value,
                held: held.clone(),
            },
            _ => ScanVerdict::Accept(value),
        }
    }

    /// The held tag, or `NoTagHeld`.
    pub fn require(&self) -> AppResult<&str> {
        match (&self.current, self.allow_actions) {
            (Some(tag), true) => Ok(tag),
            _ => Err(AppError::NoTagHeld),
        }
    }

    /// HELD → IDLE after an event was recorded for the held tag.
    pub fn complete(&mut self) {
        self.current = None;
        self.allow_actions = false;
    }

    /// HELD → IDLE without recording; returns the released tag.
    pub fn release(&mut self) -> Option<String> {
        self.allow_actions = false;
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_complete_cycle() {
        let mut hold = HoldState::default();
        assert!(matches!(hold.require(), Err(AppError::NoTagHeld)));

        assert_eq!(hold.load("  T-1 ").unwrap(), LoadOutcome::Loaded("T-1".into()));
        assert_eq!(hold.require().unwrap(), "T-1");
        assert!(hold.allow_actions());

        assert_eq!(hold.load("T-1").unwrap(), LoadOutcome::Reloaded("T-1".into()));

        hold.complete();
        assert_eq!(hold.current(), None);
        assert!(!hold.allow_actions());
    }

    #[test]
    fn second_tag_conflicts_and_keeps_the_hold() {
        let mut hold = HoldState::default();
        hold.load("T-1").unwrap();

        let err = hold.load("T-2").unwrap_err();
        assert!(matches!(err, AppError::HoldConflict { held } if held == "T-1"));
        assert_eq!(hold.current(), Some("T-1"));
    }

    #[test]
    fn blank_tag_is_rejected_before_any_change() {
        let mut hold = HoldState::default();
        assert!(matches!(hold.load("   "), Err(AppError::Validation(_))));
        assert_eq!(hold, HoldState::default());
    }

    #[test]
    fn scans_are_filtered_against_the_hold() {
        let mut hold = HoldState::default();
        assert_eq!(hold.check_scan("A-1"), ScanVerdict::Accept("A-1".into()));
        assert_eq!(hold.check_scan(" \n"), ScanVerdict::Blank);

        hold.load("A-1").unwrap();
        assert_eq!(hold.check_scan("A-1"), ScanVerdict::Accept("A-1".into()));
        assert_eq!(
            hold.check_scan("B-2"),
            ScanVerdict::Ignored {
                value: "B-2".into(),
                held: "A-1".into()
            }
        );
    }

    #[test]
    fn release_and_restore() {
        let mut hold = HoldState::restore(Some("T-9".into()));
        assert_eq!(hold.require().unwrap(), "T-9");
        assert_eq!(hold.release().as_deref(), Some("T-9"));
        assert_eq!(hold.release(), None);

        assert_eq!(HoldState::restore(Some("  ".into())), HoldState::default());
    }
}
