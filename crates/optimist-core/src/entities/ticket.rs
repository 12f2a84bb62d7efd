// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Support tickets raised by students and routed to staff.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::recipe::{MutationKind, MutationRecipe};
use crate::slice::{is_false, Entity, SliceKey};

/// Slice holding the help-desk ticket list.
pub const TICKETS: SliceKey<Ticket> = SliceKey::new("tickets");

/// Ticket workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Raised, not picked up.
    #[default]
    Open,
    /// Someone is working on it.
    InProgress,
    /// Answered; waiting for the reporter.
    Resolved,
    /// Done.
    Closed,
}

impl core::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::InProgress => "in progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        })
    }
}

/// A help-desk ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Record id.
    pub id: String,
    /// One-line summary.
    pub subject: String,
    /// Workflow state.
    #[serde(default)]
    pub status: TicketStatus,
    /// Staff member handling the ticket.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Last change.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// Not yet confirmed by the server.
    #[serde(rename = "_isOptimistic", default, skip_serializing_if = "is_false")]
    pub is_optimistic: bool,
}

impl Ticket {
    /// A freshly raised ticket.
    pub fn open(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            status: TicketStatus::Open,
            assignee: None,
            updated_at: None,
            is_optimistic: false,
        }
    }
}

/// Partial update for a [`Ticket`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    /// New workflow state.
    pub status: Option<TicketStatus>,
    /// New assignee; `Some(None)` unassigns.
    pub assignee: Option<Option<String>>,
    /// New change time.
    pub updated_at: Option<Option<OffsetDateTime>>,
}

impl Entity for Ticket {
    type Key = String;
    type Patch = TicketPatch;

    fn key(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, patch: &TicketPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee.clone_from(assignee);
        }
        if let Some(at) = patch.updated_at {
            self.updated_at = at;
        }
    }

    fn set_optimistic(&mut self, optimistic: bool) {
        self.is_optimistic = optimistic;
    }

    fn is_optimistic(&self) -> bool {
        self.is_optimistic
    }
}

/// Move the ticket to `status`.
pub fn update_status(id: impl Into<String>, status: TicketStatus, at: OffsetDateTime) -> MutationRecipe<Ticket> {
    let patch = TicketPatch {
        status: Some(status),
        updated_at: Some(Some(at)),
        ..TicketPatch::default()
    };
    MutationRecipe::patch(MutationKind::Update, TICKETS, id.into(), patch).with_messages(
        format!("Marking ticket {status}..."),
        format!("Ticket marked {status}"),
        "Could not update ticket",
    )
}

/// Hand the ticket to `assignee`; `None` unassigns.
pub fn assign(id: impl Into<String>, assignee: Option<String>, at: OffsetDateTime) -> MutationRecipe<Ticket> {
    let patch = TicketPatch {
        assignee: Some(assignee),
        updated_at: Some(Some(at)),
        ..TicketPatch::default()
    };
    MutationRecipe::patch(MutationKind::Update, TICKETS, id.into(), patch).with_messages(
        "Assigning ticket...",
        "Ticket assigned",
        "Could not assign ticket",
    )
}

/// Remove the ticket from the list.
pub fn delete(id: impl Into<String>) -> MutationRecipe<Ticket> {
    MutationRecipe::remove(TICKETS, id.into()).with_messages(
        "Deleting ticket...",
        "Ticket deleted",
        "Could not delete ticket",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::Slice;
    use time::macros::datetime;

    #[test]
    fn status_recipe_names_the_new_state() {
        let recipe = update_status("T1", TicketStatus::InProgress, datetime!(2024-05-02 09:30 UTC));
        assert_eq!(recipe.loading_message, "Marking ticket in progress...");
        assert_eq!(recipe.commit_message, "Ticket marked in progress");
    }

    #[test]
    fn unassign_clears_assignee() {
        let mut ticket = Ticket::open("T1", "VPN access");
        ticket.assignee = Some("staff-4".into());
        let slice = Slice::from_items(vec![ticket]);
        let next = assign("T1", None, datetime!(2024-05-02 09:30 UTC)).apply_optimistic(&slice);
        assert_eq!(next.items[0].assignee, None);
        assert_eq!(next.items[0].subject, "VPN access");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(TicketStatus::InProgress).unwrap();
        assert_eq!(json, "in_progress");
    }
}
