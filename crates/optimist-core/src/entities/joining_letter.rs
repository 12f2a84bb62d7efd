// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Joining letters uploaded by students and reviewed by staff.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ReviewStatus;
use crate::recipe::{MutationKind, MutationRecipe};
use crate::slice::{is_false, Entity, SliceKey};

/// Slice holding the reviewer's list of joining letters.
pub const JOINING_LETTERS: SliceKey<JoiningLetter> = SliceKey::new("joiningLetters");

/// A student's joining letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoiningLetter {
    /// Record id.
    pub id: String,
    /// Owning student.
    pub student_id: String,
    /// Uploaded scan.
    #[serde(default)]
    pub file_url: Option<String>,
    /// Review outcome.
    #[serde(default)]
    pub status: ReviewStatus,
    /// When a reviewer acted on the letter.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub reviewed_at: Option<OffsetDateTime>,
    /// Reviewer's note.
    #[serde(default)]
    pub review_remarks: Option<String>,
    /// Not yet confirmed by the server.
    #[serde(rename = "_isOptimistic", default, skip_serializing_if = "is_false")]
    pub is_optimistic: bool,
}

impl JoiningLetter {
    /// An unreviewed letter.
    pub fn pending(id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            file_url: None,
            status: ReviewStatus::Pending,
            reviewed_at: None,
            review_remarks: None,
            is_optimistic: false,
        }
    }
}

/// Partial update for a [`JoiningLetter`]. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoiningLetterPatch {
    /// New review outcome.
    pub status: Option<ReviewStatus>,
    /// New review time.
    pub reviewed_at: Option<Option<OffsetDateTime>>,
    /// New reviewer's note.
    pub review_remarks: Option<Option<String>>,
}

impl JoiningLetterPatch {
    /// Verified at `at`.
    pub fn verified(at: OffsetDateTime) -> Self {
        Self {
            status: Some(ReviewStatus::Verified),
            reviewed_at: Some(Some(at)),
            review_remarks: None,
        }
    }

    /// Rejected at `at` for `reason`.
    pub fn rejected(at: OffsetDateTime, reason: &str) -> Self {
        Self {
            status: Some(ReviewStatus::Rejected),
            reviewed_at: Some(Some(at)),
            review_remarks: Some(Some(format!("rejected: {reason}"))),
        }
    }
}

impl Entity for JoiningLetter {
    type Key = String;
    type Patch = JoiningLetterPatch;

    fn key(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, patch: &JoiningLetterPatch) {
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

/// Accept the letter.
pub fn verify(id: impl Into<String>, at: OffsetDateTime) -> MutationRecipe<JoiningLetter> {
    MutationRecipe::patch(
        MutationKind::Verify,
        JOINING_LETTERS,
        id.into(),
        JoiningLetterPatch::verified(at),
    )
    .with_messages(
        "Verifying joining letter...",
        "Joining letter verified",
        "Could not verify joining letter",
    )
}

/// Refuse the letter, recording `reason` in the remarks.
pub fn reject(id: impl Into<String>, reason: &str, at: OffsetDateTime) -> MutationRecipe<JoiningLetter> {
    MutationRecipe::patch(
        MutationKind::Reject,
        JOINING_LETTERS,
        id.into(),
        JoiningLetterPatch::rejected(at, reason),
    )
    .with_messages(
        "Rejecting joining letter...",
        "Joining letter rejected",
        "Could not reject joining letter",
    )
}

/// Remove the letter from the list.
pub fn delete(id: impl Into<String>) -> MutationRecipe<JoiningLetter> {
    MutationRecipe::remove(JOINING_LETTERS, id.into()).with_messages(
        "Deleting joining letter...",
        "Joining letter deleted",
        "Could not delete joining letter",
    )
}
