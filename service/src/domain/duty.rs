//! [`Duty`] definitions.

use std::{convert::Infallible, fmt};

use common::{define_kind, DateTime, Money, Percent};
use derive_more::{Display, From, FromStr, Into};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    charge::{self, CalculationError, Charges},
    expense,
    rate::{PackageCode, Tables, VehicleType},
    user,
};

/// Single scheduled or executed transport job for a guest.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Duty {
    /// ID of this [`Duty`].
    pub id: Id,

    /// Human-readable [`TripId`] of this [`Duty`].
    pub trip_id: TripId,

    /// [`Guest`] being transported.
    pub guest: Guest,

    /// [`DateTime`] when the [`Guest`] is picked up.
    pub pickup_at: DateTime,

    /// Location the [`Guest`] is picked up at.
    pub pickup_location: String,

    /// Location the [`Guest`] is dropped at.
    pub drop_location: String,

    /// [`VehicleType`] requested for this [`Duty`].
    pub vehicle_type: VehicleType,

    /// [`Kind`] of this [`Duty`].
    #[serde(rename = "dutyType")]
    pub kind: Kind,

    /// [`PackageCode`] of a [`Kind::LocalUse`] [`Duty`].
    pub package_code: Option<PackageCode>,

    /// Special request of the [`Guest`].
    pub special_request: String,

    /// [`CarNumber`] of the assigned car.
    pub car_number: Option<CarNumber>,

    /// Name of the assigned chauffeur.
    pub chauffeur_name: Option<user::Name>,

    /// Odometer reading at the trip start.
    pub start_km: Option<Decimal>,

    /// Odometer reading at the trip end.
    pub end_km: Option<Decimal>,

    /// [`DateTime`] when the trip started.
    pub start_time: Option<DateTime>,

    /// [`DateTime`] when the trip ended.
    pub end_time: Option<DateTime>,

    /// Additional [`charge::Usage`] beyond the package.
    pub usage: charge::Usage,

    /// Remarks justifying the additional [`charge::Usage`].
    pub additional_charges_remark: UsageRemark,

    /// [`charge::Mode`] the [`Guest`] is billed in.
    #[serde(rename = "charges")]
    pub charge_mode: charge::Mode,

    /// Discount for the [`Guest`].
    #[serde(rename = "discountPercentage")]
    pub discount: Percent,

    /// Remark justifying the `discount`.
    pub discount_remark: String,

    /// Total the [`Guest`] pays.
    pub discounted_price: Money,

    /// Expenses allocated to a [`charge::Party`] on verification.
    pub verified_expenses: Vec<expense::Verified>,

    /// Expenses recorded by the chauffeur.
    pub expenses: expense::Ledger,

    /// Last calculated [`Charges`].
    #[serde(rename = "chargeBreakdowns")]
    pub charges: Charges,

    /// Current [`Status`].
    pub status: Status,

    /// History of the [`Status`] transitions, oldest first.
    pub status_history: Vec<StatusChange>,

    /// Reason of this [`Duty`] cancellation.
    pub cancellation_reason: Option<String>,

    /// ID of the user who created this [`Duty`].
    pub created_by: user::Id,

    /// [`DateTime`] when this [`Duty`] was created.
    pub created_at: DateTime,
}

impl Duty {
    /// Transitions this [`Duty`] to the provided [`Status`], recording it in
    /// the history.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.status_history.push(StatusChange {
            status,
            at: DateTime::now(),
        });
    }

    /// Indicates whether this [`Duty`] is assigned to the chauffeur with the
    /// provided [`user::Name`].
    #[must_use]
    pub fn is_assigned_to(&self, chauffeur: &user::Name) -> bool {
        self.chauffeur_name.as_ref() == Some(chauffeur)
    }

    /// Returns the [`charge::Context`] of this [`Duty`] current state.
    #[must_use]
    pub fn charge_context(&self, apply_discount: bool) -> charge::Context {
        charge::Context {
            kind: self.kind.clone(),
            vehicle_type: self.vehicle_type.clone(),
            package_code: self.package_code.clone(),
            usage: self.usage,
            discount: self.discount,
            apply_discount,
            mode: self.charge_mode,
            verified_expenses: self.verified_expenses.clone(),
        }
    }

    /// Stores the provided [`Charges`] in this [`Duty`].
    pub fn apply_charges(&mut self, charges: Charges) {
        self.discounted_price = charges.guest.total;
        self.charges = charges;
    }

    /// Recalculates and stores [`Charges`] of this [`Duty`] current state.
    ///
    /// # Errors
    ///
    /// If the required rates are absent in the [`Tables`].
    pub fn recalculate(
        &mut self,
        tables: &Tables,
        apply_discount: bool,
    ) -> Result<Charges, CalculationError> {
        let charges =
            charge::calculate(&self.charge_context(apply_discount), tables)?;
        self.apply_charges(charges);
        Ok(charges)
    }
}

/// ID of a [`Duty`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
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

/// Human-readable trip ID in the `TR/NN/DDMMYY` format, where `NN` is the
/// per-day sequence number.
#[derive(
    Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub struct TripId(String);

impl TripId {
    /// Creates a new [`TripId`] of the provided per-day `sequence` number on
    /// the day of the provided [`DateTime`].
    #[must_use]
    pub fn new(sequence: u32, day: DateTime) -> Self {
        let date = day.date();
        Self(format!(
            "TR/{sequence:02}/{:02}{:02}{:02}",
            date.day(),
            u8::from(date.month()),
            date.year().rem_euclid(100),
        ))
    }
}

impl AsRef<str> for TripId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Guest being transported.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    /// [`GuestName`] of this [`Guest`].
    pub name: GuestName,

    /// Type of this [`Guest`] (`In-house`, `Walk-in`, etc.).
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Room number of an in-house [`Guest`].
    pub room_number: Option<String>,

    /// Mobile number of this [`Guest`].
    pub mobile_number: Option<String>,
}

define_text! {
    #[doc = "Name of a [`Guest`]."]
    struct GuestName(max = 256);
}

define_text! {
    #[doc = "Registration number of a car."]
    struct CarNumber(max = 32);
}

/// Remarks justifying the additional [`charge::Usage`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UsageRemark {
    /// Remark of the additional kilometers.
    #[serde(default)]
    pub km: String,

    /// Remark of the additional hours.
    #[serde(default)]
    pub hr: String,
}

/// Kind of a [`Duty`], which its rates are keyed by.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Kind {
    /// Pickup from an airport.
    AirportPickup,

    /// Drop to an airport.
    AirportDrop,

    /// Hourly and kilometer based package hire.
    LocalUse,

    /// Any other configured point-to-point duty.
    Other(String),
}

impl Kind {
    /// Returns the name of this [`Kind`] its rates are keyed by.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AirportPickup => "Airport Pickup",
            Self::AirportDrop => "Airport Drop",
            Self::LocalUse => "Local Use",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Airport Pickup" => Self::AirportPickup,
            "Airport Drop" => Self::AirportDrop,
            "Local Use" => Self::LocalUse,
            _ => Self::Other(name),
        }
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Other(name) => name,
            Kind::AirportPickup | Kind::AirportDrop | Kind::LocalUse => {
                kind.as_str().to_owned()
            }
        }
    }
}

impl FromStr for Kind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.to_owned().into())
    }
}

define_kind! {
    #[doc = "Status of a [`Duty`]."]
    enum Status {
        #[doc = "Created, but no car or chauffeur is assigned yet."]
        Pending = 1 => "pending",

        #[doc = "Car and chauffeur are assigned."]
        Active = 2 => "active",

        #[doc = "Trip is being executed."]
        InProgress = 3 => "in-progress",

        #[doc = "Trip is ended and awaits the transport desk verification."]
        PendingVerificationTransport = 4 => "pending-verification-transport",

        #[doc = "Transport desk verified and awaits the concierge \
                 verification."]
        PendingVerificationConcierge = 5 => "pending-verification-concierge",

        #[doc = "Verified by both desks."]
        Completed = 6 => "completed",

        #[doc = "Cancelled before completion."]
        Cancelled = 7 => "cancelled",
    }
}

impl Status {
    /// Indicates whether this [`Status`] is final.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Record of a [`Status`] transition.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StatusChange {
    /// [`Status`] transitioned to.
    pub status: Status,

    /// [`DateTime`] of the transition.
    #[serde(rename = "timestamp")]
    pub at: DateTime,
}
