// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity families mutated optimistically by the review and ticket screens.
//!
//! Each family owns its record type, its patch type, the slice it lives in,
//! and recipe constructors for the mutations the UI issues against it.

use serde::{Deserialize, Serialize};

pub mod joining_letter;
pub mod monthly_report;
pub mod ticket;

pub use joining_letter::{JoiningLetter, JoiningLetterPatch, JOINING_LETTERS};
pub use monthly_report::{MonthlyReport, MonthlyReportPatch, MONTHLY_REPORTS};
pub use ticket::{Ticket, TicketPatch, TicketStatus, TICKETS};

/// Review outcome for documents submitted by students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting a reviewer.
    #[default]
    Pending,
    /// Accepted by a reviewer.
    Verified,
    /// Refused by a reviewer.
    Rejected,
}
