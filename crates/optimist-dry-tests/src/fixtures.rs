// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Small slices and fixed timestamps shared across tests.

use optimist_core::entities::{JoiningLetter, MonthlyReport, Ticket};
use optimist_core::Slice;
use time::macros::datetime;
use time::OffsetDateTime;

/// Client clock reading used for optimistic review timestamps.
pub const REVIEWED_AT: OffsetDateTime = datetime!(2024-03-01 10:00:00 UTC);

/// Authoritative timestamp the fake server assigns, later than [`REVIEWED_AT`].
pub const SERVER_AT: OffsetDateTime = datetime!(2024-03-01 10:00:02.5 UTC);

/// Two pending letters: `L1` for student `S1` and `L2` for student `S2`.
pub fn letter_slice() -> Slice<JoiningLetter> {
    Slice::from_items(vec![
        JoiningLetter::pending("L1", "S1"),
        JoiningLetter::pending("L2", "S2"),
    ])
}

/// Two submitted reports for student `S1`: `R1` (January) and `R2` (February).
pub fn report_slice() -> Slice<MonthlyReport> {
    Slice::from_items(vec![
        MonthlyReport::submitted("R1", "S1", 1),
        MonthlyReport::submitted("R2", "S1", 2),
    ])
}

/// Three open tickets `T1`..`T3`.
pub fn ticket_slice() -> Slice<Ticket> {
    Slice::from_items(vec![
        Ticket::open("T1", "Cannot upload letter"),
        Ticket::open("T2", "Wrong month on report"),
        Ticket::open("T3", "Password reset"),
    ])
}
