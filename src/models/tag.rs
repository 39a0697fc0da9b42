use super::status::Status;
use serde::Serialize;

/// Last known state of a tag, as seen in the backend's status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub status: Status,   // ⇔ tags.status (wire spelling)
    pub sector: String,   // ⇔ tags.sector ("setor" on the wire)
    pub class: String,    // ⇔ tags.class  ("classe" on the wire)
}

impl TagRecord {
    pub fn new(status: Status, sector: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            status,
            sector: sector.into(),
            class: class.into(),
        }
    }
}

/// Result of a status cache lookup.
///
/// A tag missing from the cache is *unregistered*: a legitimate state the
/// operator can still record events for, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Registered(TagRecord),
    Unregistered,
}

impl Lookup {
    pub fn status(&self) -> Option<Status> {
        match self {
            Lookup::Registered(rec) => Some(rec.status),
            Lookup::Unregistered => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Lookup::Registered(_))
    }

    /// Status label shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            Lookup::Registered(rec) => rec.status.name(),
            Lookup::Unregistered => "UNREGISTERED",
        }
    }
}

/// Trim an operator supplied identifier; `None` when nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_trimmed() {
        assert_eq!(normalize_tag("  TAG-01\t").as_deref(), Some("TAG-01"));
        assert_eq!(normalize_tag(" \n "), None);
    }

    #[test]
    fn unregistered_is_a_state_not_an_error() {
        let rec = Lookup::Registered(TagRecord::new(Status::NoAccess, "SUL", ""));
        assert_eq!(rec.status(), Some(Status::NoAccess));
        assert_eq!(rec.label(), "NO_ACCESS");
        assert_eq!(Lookup::Unregistered.status(), None);
        assert_eq!(Lookup::Unregistered.label(), "UNREGISTERED");
    }
}
