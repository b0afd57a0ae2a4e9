//! [`Actor`] definitions.

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Duty;

/// User performing an operation.
///
/// Users themselves are managed by an external identity provider, so only
/// the attributes required for authorization and audit are kept here.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Actor {
    /// ID of the user.
    pub id: Id,

    /// [`Name`] of the user.
    pub name: Name,

    /// [`Role`]s granted to the user.
    pub roles: Vec<Role>,
}

impl Actor {
    /// Indicates whether this [`Actor`] has the provided [`Role`].
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Indicates whether this [`Actor`] is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// ID of a user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Name of a user (a chauffeur's name is what [`Duty`]s are \
             assigned by)."]
    struct Name(max = 256);
}

define_kind! {
    #[doc = "Role of a user."]
    enum Role {
        #[doc = "Administrator managing settings."]
        Admin = 1 => "Admin",

        #[doc = "Concierge desk creating and finally verifying duties."]
        Concierge = 2 => "Concierge",

        #[doc = "Transport desk assigning and verifying duties."]
        Transport = 3 => "Transport",

        #[doc = "Chauffeur executing trips."]
        Chauffeur = 4 => "Chauffeur",
    }
}
