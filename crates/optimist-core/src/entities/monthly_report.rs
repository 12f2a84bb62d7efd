// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Monthly progress reports submitted during an internship.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ReviewStatus;
use crate::recipe::{MutationKind, MutationRecipe};
use crate::slice::{is_false, Entity, SliceKey};

/// Slice holding the mentor's list of monthly reports.
pub const MONTHLY_REPORTS: SliceKey<MonthlyReport> = SliceKey::new("monthlyReports");

/// One month's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// Record id.
    pub id: String,
    /// Owning student.
    pub student_id: String,
    /// Report month, 1-based from the internship start.
    pub month: u32,
    /// Review outcome.
    #[serde(default)]
    pub status: ReviewStatus,
    /// When a reviewer acted on the report.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
    /// Reviewer's note.
    #[serde(default)]
    pub review_remarks: Option<String>,
    /// Not yet confirmed by the server.
    #[serde(rename = "_isOptimistic", default, skip_serializing_if = "is_false")]
    pub is_optimistic: bool,
}

impl MonthlyReport {
    /// An unreviewed report for `month`.
    pub fn submitted(id: impl Into<String>, student_id: impl Into<String>, month: u32) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            month,
            status: ReviewStatus::Pending,
            reviewed_at: None,
            review_remarks: None,
            is_optimistic: false,
        }
    }
}

/// Partial update for a [`MonthlyReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyReportPatch {
    /// New review outcome.
    pub status: Option<ReviewStatus>,
    /// New review time.
    pub reviewed_at: Option<Option<OffsetDateTime>>,
    /// New reviewer's note.
    pub review_remarks: Option<Option<String>>,
}

impl Entity for MonthlyReport {
    type Key = String;
    type Patch = MonthlyReportPatch;

    fn key(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, patch: &MonthlyReportPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(at) = patch.reviewed_at {
            self.reviewed_at = at;
        }
        if let Some(remarks) = &patch.review_remarks {
            self.review_remarks.clone_from(remarks);
        }
    }

    fn set_optimistic(&mut self, optimistic: bool) {
        self.is_optimistic = optimistic;
    }

    fn is_optimistic(&self) -> bool {
        self.is_optimistic
    }
}

/// Accept the report.
pub fn approve(id: impl Into<String>, at: OffsetDateTime) -> MutationRecipe<MonthlyReport> {
    let patch = MonthlyReportPatch {
        status: Some(ReviewStatus::Verified),
        reviewed_at: Some(Some(at)),
        review_remarks: None,
    };
    MutationRecipe::patch(MutationKind::Verify, MONTHLY_REPORTS, id.into(), patch).with_messages(
        "Approving report...",
        "Report approved",
        "Could not approve report",
    )
}

/// Send the report back with `reason`.
pub fn reject(id: impl Into<String>, reason: &str, at: OffsetDateTime) -> MutationRecipe<MonthlyReport> {
    let patch = MonthlyReportPatch {
        status: Some(ReviewStatus::Rejected),
        reviewed_at: Some(Some(at)),
        review_remarks: Some(Some(format!("rejected: {reason}"))),
    };
    MutationRecipe::patch(MutationKind::Reject, MONTHLY_REPORTS, id.into(), patch).with_messages(
        "Rejecting report...",
        "Report rejected",
        "Could not reject report",
    )
}

/// Replace the reviewer's note; `None` clears it.
pub fn update_remarks(id: impl Into<String>, remarks: Option<String>) -> MutationRecipe<MonthlyReport> {
    let patch = MonthlyReportPatch {
        review_remarks: Some(remarks),
        ..MonthlyReportPatch::default()
    };
    MutationRecipe::patch(MutationKind::Update, MONTHLY_REPORTS, id.into(), patch).with_messages(
        "Saving remarks...",
        "Remarks saved",
        "Could not save remarks",
    )
}
