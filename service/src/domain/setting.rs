//! [`Setting`] definitions.

use common::{define_kind, DateTime};
use serde::{Deserialize, Serialize};

use crate::domain::user;
#[cfg(doc)]
use crate::domain::rate::Tables;

/// Administratively maintained document of the rate configuration store.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    /// [`Key`] of this [`Setting`].
    pub key: Key,

    /// Human-readable label of this [`Setting`].
    pub label: String,

    /// Loosely typed values, parsed into [`Tables`] on demand.
    pub values: serde_json::Value,

    /// ID of the user who last updated this [`Setting`].
    pub updated_by: user::Id,

    /// [`DateTime`] when this [`Setting`] was last updated.
    pub updated_at: DateTime,
}

impl Setting {
    /// Creates a new [`Setting`] labeled after its [`Key`].
    #[must_use]
    pub fn new(
        key: Key,
        values: serde_json::Value,
        updated_by: user::Id,
    ) -> Self {
        Self {
            key,
            label: key.label().to_owned(),
            values,
            updated_by,
            updated_at: DateTime::now(),
        }
    }
}

define_kind! {
    #[doc = "Key of a [`Setting`]."]
    enum Key {
        #[doc = "Configured duty types."]
        DutyTypes = 1 => "dutyTypes",

        #[doc = "Configured vehicle types."]
        VehicleTypes = 2 => "vehicleTypes",

        #[doc = "Local use packages with their included hours and kilometers."]
        LocalUsePackages = 3 => "localUsePackages",

        #[doc = "Guest base rates by vehicle and duty type."]
        GuestCharges = 4 => "guestCharges",

        #[doc = "Backend base rates by vehicle and duty type."]
        BackendCharges = 5 => "backendCharges",

        #[doc = "Guest local use rates by package and vehicle."]
        LocalUseCharges = 6 => "localUseCharges",

        #[doc = "Backend local use rates by package and vehicle."]
        BackendLocalUseCharges = 7 => "backendLocalUseCharges",

        #[doc = "Guest extra usage rates by vehicle."]
        GuestExtraCharges = 8 => "guestExtraCharges",

        #[doc = "Backend extra usage rates by vehicle."]
        BackendExtraCharges = 9 => "backendExtraCharges",

        #[doc = "Part of package rates by vehicle and duty type."]
        PopCharges = 10 => "popCharges",
    }
}

impl Key {
    /// Returns the default human-readable label of this [`Key`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DutyTypes => "Duty Types",
            Self::VehicleTypes => "Vehicle Types",
            Self::LocalUsePackages => "Local Use Packages",
            Self::GuestCharges => "Guest Charges",
            Self::BackendCharges => "Backend Charges",
            Self::LocalUseCharges => "Local Use Charges",
            Self::BackendLocalUseCharges => "Backend Local Use Charges",
            Self::GuestExtraCharges => "Guest Extra Charges",
            Self::BackendExtraCharges => "Backend Extra Charges",
            Self::PopCharges => "Part of Package Charges",
        }
    }
}

/// Audit record of a [`Setting`] modification.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// [`Key`] of the modified [`Setting`].
    pub key: Key,

    /// [`Action`] performed upon the [`Setting`].
    pub action: Action,

    /// Values before the modification.
    pub from: Option<serde_json::Value>,

    /// Values after the modification.
    pub to: Option<serde_json::Value>,

    /// ID of the user who performed the modification.
    pub updated_by: user::Id,

    /// [`DateTime`] of the modification.
    pub at: DateTime,
}

define_kind! {
    #[doc = "Action performed upon a [`Setting`]."]
    enum Action {
        #[doc = "[`Setting`] was created."]
        Create = 1 => "create",

        #[doc = "[`Setting`] values were replaced."]
        Update = 2 => "update",

        #[doc = "[`Setting`] was deleted."]
        Delete = 3 => "delete",
    }
}
