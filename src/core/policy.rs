//! Status transition rules: which requested changes go straight to the
//! queue and which must first be confirmed by the operator.

use crate::models::{Lookup, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much friction a status change gets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// Only reopening completed work asks for confirmation.
    #[default]
    ReopenOnly,
    /// Any change away from a non-pending status asks for confirmation.
    Strict,
}

/// A question the operator has to answer before an event is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRequest {
    /// Leaving COMPLETED.
    Reopen { tag: String, from: Status, to: Status },
    /// Leaving a non-pending status under the strict policy.
    Change { tag: String, from: Status, to: Status },
    /// The requested status is already recorded; confirming refreshes the
    /// location only.
    SameStatus { tag: String, status: Status },
    /// The backend answered a direct submission with its own last status.
    ServerConflict {
        tag: String,
        last_status: String,
        to: Status,
    },
}

impl ConfirmRequest {
    pub fn tag(&self) -> &str {
        match self {
            ConfirmRequest::Reopen { tag, .. }
            | ConfirmRequest::Change { tag, .. }
            | ConfirmRequest::SameStatus { tag, .. }
            | ConfirmRequest::ServerConflict { tag, .. } => tag,
        }
    }

    pub fn is_location_refresh(&self) -> bool {
        matches!(self, ConfirmRequest::SameStatus { .. })
    }
}

impl fmt::Display for ConfirmRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmRequest::Reopen { tag, from, to } | ConfirmRequest::Change { tag, from, to } => {
                write!(f, "Confirm status change for {tag}? From: {from} To: {to}")
            }
            ConfirmRequest::SameStatus { tag, status } => {
                write!(f, "{tag} is already {status}. Refresh its location?")
            }
            ConfirmRequest::ServerConflict {
                tag,
                last_status,
                to,
            } => write!(
                f,
                "Server reports {tag} as {last_status}. Record {to} anyway?"
            ),
        }
    }
}

/// Outcome of the policy for one requested change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Confirm(ConfirmRequest),
}

/// Decide whether `requested` may be recorded for `tag` right away.
pub fn evaluate(policy: ConfirmationPolicy, tag: &str, current: &Lookup, requested: Status) -> Gate {
    let Some(from) = current.status() else {
        // Unregistered: no previous status to protect.
        return Gate::Proceed;
    };

    if from == requested {
        return Gate::Confirm(ConfirmRequest::SameStatus {
            tag: tag.to_string(),
            status: from,
        });
    }

    if from.is_completed() {
        return Gate::Confirm(ConfirmRequest::Reopen {
            tag: tag.to_string(),
            from,
            to: requested,
        });
    }

    if policy == ConfirmationPolicy::Strict && !from.is_pending() {
        return Gate::Confirm(ConfirmRequest::Change {
            tag: tag.to_string(),
            from,
            to: requested,
        });
    }

    Gate::Proceed
}

/// Which actions are offered for a loaded tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPanel {
    /// Action buttons in display order, with their enabled flag.
    pub actions: Vec<(Status, bool)>,
    /// The location-only refresh is offered for completed tags only.
    pub location_refresh: bool,
}

impl ActionPanel {
    pub fn for_lookup(current: &Lookup) -> Self {
        let status = current.status();
        let registered_non_pending = matches!(status, Some(s) if !s.is_pending());

        let mut actions = Vec::new();
        for st in [Status::Completed, Status::PendingObra, Status::NoAccess] {
            // The button of the current non-pending status is disabled.
            let enabled = !(registered_non_pending && status == Some(st));
            actions.push((st, enabled));
        }
        // Moving back to pending only makes sense for a registered, non-pending tag.
        if registered_non_pending {
            actions.push((Status::Pending, true));
        }

        Self {
            actions,
            location_refresh: matches!(status, Some(Status::Completed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagRecord;

    fn registered(status: Status) -> Lookup {
        Lookup::Registered(TagRecord::new(status, "NORTE", "A"))
    }

    #[test]
    fn unregistered_tags_never_ask() {
        for st in Status::ALL {
            assert_eq!(
                evaluate(ConfirmationPolicy::Strict, "T", &Lookup::Unregistered, st),
                Gate::Proceed
            );
        }
    }

    #[test]
    fn leaving_completed_always_asks() {
        for to in [Status::Pending, Status::PendingObra, Status::NoAccess] {
            let gate = evaluate(
                ConfirmationPolicy::ReopenOnly,
                "T",
                &registered(Status::Completed),
                to,
            );
            assert_eq!(
                gate,
                Gate::Confirm(ConfirmRequest::Reopen {
                    tag: "T".into(),
                    from: Status::Completed,
                    to,
                })
            );
        }
    }

    #[test]
    fn same_status_is_a_location_refresh() {
        let Gate::Confirm(req) = evaluate(
            ConfirmationPolicy::ReopenOnly,
            "T",
            &registered(Status::NoAccess),
            Status::NoAccess,
        ) else {
            panic!("same status must ask");
        };
        assert!(req.is_location_refresh());
    }

    #[test]
    fn other_changes_depend_on_the_policy() {
        let current = registered(Status::PendingObra);
        assert_eq!(
            evaluate(ConfirmationPolicy::ReopenOnly, "T", &current, Status::Completed),
            Gate::Proceed
        );
        assert!(matches!(
            evaluate(ConfirmationPolicy::Strict, "T", &current, Status::Completed),
            Gate::Confirm(ConfirmRequest::Change { .. })
        ));
        // leaving PENDING never asks
        assert_eq!(
            evaluate(
                ConfirmationPolicy::Strict,
                "T",
                &registered(Status::Pending),
                Status::Completed
            ),
            Gate::Proceed
        );
    }

    #[test]
    fn action_panel_follows_the_current_status() {
        let fresh = ActionPanel::for_lookup(&Lookup::Unregistered);
        assert_eq!(fresh.actions.len(), 3);
        assert!(fresh.actions.iter().all(|(_, enabled)| *enabled));
        assert!(!fresh.location_refresh);

        let done = ActionPanel::for_lookup(&registered(Status::Completed));
        assert!(done.location_refresh);
        assert!(done.actions.contains(&(Status::Completed, false)));
        assert!(done.actions.contains(&(Status::Pending, true)));

        let pending = ActionPanel::for_lookup(&registered(Status::Pending));
        assert!(!pending.actions.iter().any(|(st, _)| *st == Status::Pending));
    }
}
