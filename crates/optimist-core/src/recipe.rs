// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mutation recipes: what an optimistic edit does to a slice and what the
//! user is told while it settles.

use crate::reducer;
use crate::slice::{Entity, Slice, SliceKey};

/// Business meaning of a mutation (used for messages and log fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Mark a record as reviewed and accepted.
    Verify,
    /// Mark a record as reviewed and refused.
    Reject,
    /// Change fields of a record.
    Update,
    /// Remove a record.
    Delete,
    /// Add a record.
    Create,
}

impl MutationKind {
    const fn verb(self) -> (&'static str, &'static str) {
        match self {
            Self::Verify => ("Verifying", "verified"),
            Self::Reject => ("Rejecting", "rejected"),
            Self::Update => ("Saving", "saved"),
            Self::Delete => ("Deleting", "deleted"),
            Self::Create => ("Creating", "created"),
        }
    }
}

impl core::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Verify => "verify",
            Self::Reject => "reject",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
        })
    }
}

/// The optimistic change a recipe makes to its slice.
#[derive(Debug, Clone)]
pub enum OptimisticEdit<E: Entity> {
    /// Merge `patch` into the record with `key`.
    Patch {
        /// Target record.
        key: E::Key,
        /// Fields to change.
        patch: E::Patch,
    },
    /// Drop the record with `key`.
    Remove {
        /// Target record.
        key: E::Key,
    },
    /// Add a record at the head of the list.
    Insert(E),
}

/// One mutation, ready to hand to [`crate::Orchestrator`].
#[derive(Debug, Clone)]
pub struct MutationRecipe<E: Entity> {
    /// Business meaning.
    pub kind: MutationKind,
    /// Slice the edit applies to.
    pub slice: SliceKey<E>,
    /// Optimistic change.
    pub edit: OptimisticEdit<E>,
    /// Shown while the server call is outstanding.
    pub loading_message: String,
    /// Shown on commit.
    pub commit_message: String,
    /// Shown on rollback when the failure carries no server message.
    pub rollback_message: String,
}

impl<E: Entity> MutationRecipe<E> {
    /// Recipe with default messages derived from `kind` and the slice name.
    pub fn new(kind: MutationKind, slice: SliceKey<E>, edit: OptimisticEdit<E>) -> Self {
        let (doing, done) = kind.verb();
        Self {
            kind,
            slice,
            edit,
            loading_message: format!("{doing}..."),
            commit_message: format!("Successfully {done}"),
            rollback_message: format!("Could not complete {kind}"),
        }
    }

    /// Recipe that patches one record.
    pub fn patch(kind: MutationKind, slice: SliceKey<E>, key: E::Key, patch: E::Patch) -> Self {
        Self::new(kind, slice, OptimisticEdit::Patch { key, patch })
    }

    /// Recipe that removes one record.
    pub fn remove(slice: SliceKey<E>, key: E::Key) -> Self {
        Self::new(MutationKind::Delete, slice, OptimisticEdit::Remove { key })
    }

    /// Recipe that inserts one record.
    pub fn insert(slice: SliceKey<E>, entity: E) -> Self {
        Self::new(MutationKind::Create, slice, OptimisticEdit::Insert(entity))
    }

    /// Replaces the three user-facing messages.
    pub fn with_messages(
        mut self,
        loading: impl Into<String>,
        commit: impl Into<String>,
        rollback: impl Into<String>,
    ) -> Self {
        self.loading_message = loading.into();
        self.commit_message = commit.into();
        self.rollback_message = rollback.into();
        self
    }

    /// Key of the record the edit targets.
    pub fn entity_key(&self) -> &E::Key {
        match &self.edit {
            OptimisticEdit::Patch { key, .. } | OptimisticEdit::Remove { key } => key,
            OptimisticEdit::Insert(entity) => entity.key(),
        }
    }

    /// Runs the edit's reducer against `slice`.
    pub fn apply_optimistic(&self, slice: &Slice<E>) -> Slice<E> {
        match &self.edit {
            OptimisticEdit::Patch { key, patch } => reducer::apply_optimistic_patch(slice, key, patch),
            OptimisticEdit::Remove { key } => reducer::remove_entity(slice, key),
            OptimisticEdit::Insert(entity) => reducer::insert_entity(slice, entity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{JoiningLetter, JOINING_LETTERS};

    #[test]
    fn default_messages_follow_kind() {
        let recipe = MutationRecipe::remove(JOINING_LETTERS, "L1".to_string());
        assert_eq!(recipe.loading_message, "Deleting...");
        assert_eq!(recipe.commit_message, "Successfully deleted");
        assert_eq!(recipe.rollback_message, "Could not complete delete");
    }

    #[test]
    fn insert_targets_the_new_record() {
        let recipe = MutationRecipe::insert(JOINING_LETTERS, JoiningLetter::pending("L9", "S9"));
        assert_eq!(recipe.entity_key(), "L9");
        let next = recipe.apply_optimistic(&Slice::default());
        assert_eq!(next.items.len(), 1);
    }
}
