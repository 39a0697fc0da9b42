use crate::errors::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid regex"));

/// Closed set of inspection states a tag can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Status {
    /// Inspection not done yet.
    Pending,
    /// Work completed (terminal).
    Completed,
    /// Blocked until construction work is done.
    PendingObra,
    /// Blocked, the asset could not be reached.
    NoAccess,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Completed,
        Status::PendingObra,
        Status::NoAccess,
    ];

    /// Convert enum → backend/storage spelling
    pub fn to_wire(&self) -> &'static str {
        match self {
            Status::Pending => "PENDENTE",
            Status::Completed => "CONCLUIDO",
            Status::PendingObra => "PENDENTE OBRA",
            Status::NoAccess => "SEM ACESSO",
        }
    }

    /// Convert enum → action code (the spelling used on buttons and in the CLI)
    pub fn action_code(&self) -> &'static str {
        match self {
            Status::Pending => "PENDENTE",
            Status::Completed => "CONCLUIDO",
            Status::PendingObra => "PENDENTE_OBRA",
            Status::NoAccess => "SEM_ACESSO",
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Completed => "COMPLETED",
            Status::PendingObra => "PENDING_OBRA",
            Status::NoAccess => "NO_ACCESS",
        }
    }

    /// Convert any known spelling → enum.
    ///
    /// Case, surrounding blanks and the space/underscore separator are
    /// irrelevant: `pendente obra`, `PENDENTE_OBRA` and `pending_obra` all
    /// map to [`Status::PendingObra`].
    pub fn from_wire(raw: &str) -> Option<Self> {
        let key = SPACES.replace_all(raw.trim(), "_").to_uppercase();
        match key.as_str() {
            "PENDENTE" | "PENDING" => Some(Status::Pending),
            "CONCLUIDO" | "CONCLUÍDO" | "COMPLETED" => Some(Status::Completed),
            "PENDENTE_OBRA" | "PENDING_OBRA" => Some(Status::PendingObra),
            "SEM_ACESSO" | "NO_ACCESS" => Some(Status::NoAccess),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::from_wire(s).ok_or_else(|| AppError::InvalidStatus(s.to_string()))
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.to_wire().to_string()
    }
}

impl TryFrom<String> for Status {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_survives_both_spellings() {
        for st in Status::ALL {
            assert_eq!(Status::from_wire(st.to_wire()), Some(st));
            assert_eq!(Status::from_wire(st.action_code()), Some(st));
            assert_eq!(Status::from_wire(st.name()), Some(st));
        }
    }

    #[test]
    fn parsing_ignores_case_and_extra_blanks() {
        assert_eq!(
            Status::from_wire("  pendente   obra "),
            Some(Status::PendingObra)
        );
        assert_eq!(Status::from_wire("sem_acesso"), Some(Status::NoAccess));
        assert!(Status::from_wire("EM ANDAMENTO").is_none());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn serializes_with_backend_spelling() {
        let json = serde_json::to_string(&Status::NoAccess).unwrap();
        assert_eq!(json, "\"SEM ACESSO\"");
        let back: Status = serde_json::from_str("\"PENDENTE OBRA\"").unwrap();
        assert_eq!(back, Status::PendingObra);
    }
}
