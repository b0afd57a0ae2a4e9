//! Activity log definitions.

use common::DateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{duty, user::Actor};
#[cfg(doc)]
use crate::domain::Duty;

/// Audit record of an action performed upon a [`Duty`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// ID of the [`Duty`] the action was performed upon.
    pub duty_id: duty::Id,

    /// [`Actor`] who performed the action.
    pub actor: Actor,

    /// Human-readable description of the action.
    pub action: String,

    /// [`DateTime`] when the action was performed.
    pub at: DateTime,
}

impl Entry {
    /// Creates a new [`Entry`] happened right now.
    #[must_use]
    pub fn new(
        actor: &Actor,
        duty_id: duty::Id,
        action: impl Into<String>,
    ) -> Self {
        Self {
            duty_id,
            actor: actor.clone(),
            action: action.into(),
            at: DateTime::now(),
        }
    }
}
