//! Charge definitions and their calculation.

mod calculator;

use common::{define_kind, Money, Percent};
use derive_more::{Display, Error};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    duty, expense,
    rate::{PackageCode, VehicleType},
};
#[cfg(doc)]
use crate::domain::{rate::Tables, Duty};

pub use self::calculator::calculate;

/// Tax rate applied to both guest and backend charges.
pub const TAX_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

define_kind! {
    #[doc = "Mode controlling whether and how a guest is billed."]
    enum Mode {
        #[doc = "Guest is billed by the configured rates."]
        Chargeable = 1 => "Chargeable",

        #[doc = "Guest is not billed at all."]
        Complimentary = 2 => "Complimentary",

        #[doc = "Duty is covered by a stay package, so guest is not billed \
                 now and its cost is only reported."]
        PartOfPackage = 3 => "Part of Package",
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Chargeable
    }
}

define_kind! {
    #[doc = "Party a charge or an expense is billed to."]
    enum Party {
        #[doc = "Guest of the hotel."]
        Guest = 1 => "guest",

        #[doc = "Hotel itself (the backend cost of a duty)."]
        Backend = 2 => "backend",
    }
}

/// Components of a charge.
///
/// `total` equals `base + extra + tax`, unless verified expenses were added
/// on top of it.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Breakdown {
    /// Base rate of a duty.
    pub base: Money,

    /// Charge of the usage beyond a package.
    pub extra: Money,

    /// Tax of the `base` and `extra`.
    pub tax: Money,

    /// Amount to be paid.
    pub total: Money,
}

impl Breakdown {
    /// [`Breakdown`] of nothing to pay.
    pub const ZERO: Self = Self {
        base: Money::ZERO,
        extra: Money::ZERO,
        tax: Money::ZERO,
        total: Money::ZERO,
    };

    /// Creates a new [`Breakdown`] taxing the provided `base` and `extra`
    /// with the [`TAX_RATE`].
    ///
    /// # Errors
    ///
    /// With [`CalculationError::Overflow`] if the amounts are too large.
    pub fn taxed(base: Money, extra: Money) -> Result<Self, CalculationError> {
        use CalculationError::Overflow;

        let subtotal = base.checked_add(extra).ok_or(Overflow)?;
        let tax = subtotal.checked_mul(TAX_RATE).ok_or(Overflow)?.round();
        Ok(Self {
            base,
            extra,
            tax,
            total: subtotal.checked_add(tax).ok_or(Overflow)?,
        })
    }

    /// Returns a new [`Breakdown`] with the provided `discount` taken off
    /// its `base` and `extra`, re-taxed.
    ///
    /// # Errors
    ///
    /// With [`CalculationError::Overflow`] if the amounts are too large.
    pub fn discounted(
        &self,
        discount: Percent,
    ) -> Result<Self, CalculationError> {
        let fraction = discount.complement_fraction();
        let off = |m: Money| {
            m.checked_mul(fraction)
                .map(Money::round)
                .ok_or(CalculationError::Overflow)
        };
        Self::taxed(off(self.base)?, off(self.extra)?)
    }

    /// Returns this [`Breakdown`] with the provided untaxed `expenses` added
    /// to its `total`.
    ///
    /// # Errors
    ///
    /// With [`CalculationError::Overflow`] if the amounts are too large.
    pub fn with_expenses(
        mut self,
        expenses: Money,
    ) -> Result<Self, CalculationError> {
        self.total = self
            .total
            .checked_add(expenses)
            .ok_or(CalculationError::Overflow)?;
        Ok(self)
    }
}

/// Charges of a [`Duty`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Charges {
    /// What the guest pays.
    #[serde(rename = "guestCharge")]
    pub guest: Breakdown,

    /// What the duty costs the backend.
    #[serde(rename = "backendCharge")]
    pub backend: Breakdown,

    /// Guest charge before any discount, kept for audit and reporting.
    #[serde(rename = "originalGuestCharge")]
    pub original_guest: Breakdown,
}

/// Usage of a vehicle beyond what a local use package includes.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "RawUsage", rename_all = "camelCase")]
pub struct Usage {
    /// Additional kilometers.
    additional_km: Decimal,

    /// Additional hours.
    additional_hours: Decimal,
}

impl Usage {
    /// No additional [`Usage`].
    pub const NONE: Self = Self {
        additional_km: Decimal::ZERO,
        additional_hours: Decimal::ZERO,
    };

    /// Creates a new [`Usage`] out of the provided additional kilometers and
    /// hours.
    ///
    /// # Errors
    ///
    /// If any of the values is negative.
    pub fn new(km: Decimal, hours: Decimal) -> Result<Self, NegativeUsage> {
        if km < Decimal::ZERO || hours < Decimal::ZERO {
            return Err(NegativeUsage { km, hours });
        }
        Ok(Self {
            additional_km: km,
            additional_hours: hours,
        })
    }

    /// Returns the additional kilometers.
    #[must_use]
    pub const fn km(&self) -> Decimal {
        self.additional_km
    }

    /// Returns the additional hours.
    #[must_use]
    pub const fn hours(&self) -> Decimal {
        self.additional_hours
    }

    /// Indicates whether there is any additional [`Usage`].
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.additional_km > Decimal::ZERO || self.additional_hours > Decimal::ZERO
    }
}

/// Unvalidated [`Usage`] representation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUsage {
    #[serde(default)]
    additional_km: Decimal,
    #[serde(default)]
    additional_hours: Decimal,
}

impl TryFrom<RawUsage> for Usage {
    type Error = NegativeUsage;

    fn try_from(raw: RawUsage) -> Result<Self, Self::Error> {
        Self::new(raw.additional_km, raw.additional_hours)
    }
}

/// Error of a negative [`Usage`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("usage cannot be negative: {km} km, {hours} hours")]
pub struct NegativeUsage {
    /// Provided kilometers.
    #[error(not(source))]
    pub km: Decimal,

    /// Provided hours.
    pub hours: Decimal,
}

/// Everything [`Charges`] of a [`Duty`] are [`calculate`]d from, except the
/// rate [`Tables`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// [`duty::Kind`] of the [`Duty`].
    #[serde(rename = "dutyType")]
    pub kind: duty::Kind,

    /// [`VehicleType`] of the [`Duty`].
    pub vehicle_type: VehicleType,

    /// [`PackageCode`] of a [`duty::Kind::LocalUse`] [`Duty`].
    #[serde(default)]
    pub package_code: Option<PackageCode>,

    /// Additional [`Usage`] of the vehicle.
    #[serde(default)]
    pub usage: Usage,

    /// Discount for the guest.
    #[serde(default, rename = "discountPercentage")]
    pub discount: Percent,

    /// Indicator whether the `discount` should be applied.
    #[serde(default)]
    pub apply_discount: bool,

    /// [`Mode`] the guest is billed in.
    #[serde(default, rename = "charges")]
    pub mode: Mode,

    /// Verified expenses added on top of the charges.
    #[serde(default)]
    pub verified_expenses: Vec<expense::Verified>,
}

/// Error of [`calculate`]ing [`Charges`].
#[derive(Clone, Debug, Display, Error)]
pub enum CalculationError {
    /// Required rate is not configured.
    #[display("Missing configuration: {_0}")]
    MissingConfiguration(Missing),

    /// Verified expense has a negative amount.
    #[display("Verified expense `{_0}` cannot be negative")]
    NegativeExpense(#[error(not(source))] String),

    /// Amounts are too large to be calculated.
    #[display("Charge amounts are too large")]
    Overflow,

    /// [`duty::Kind::LocalUse`] [`Duty`] has no [`PackageCode`].
    #[display("Local use duty requires a package code")]
    PackageRequired,
}

/// Rate missing in the [`Tables`].
#[derive(Clone, Debug, Display, Error)]
pub enum Missing {
    /// Base rate of a point-to-point duty.
    #[display("no {party} rate for `{vehicle}` vehicle and `{kind}` duty")]
    Base {
        /// [`Party`] the rate is billed to.
        #[error(not(source))]
        party: Party,

        /// [`VehicleType`] the rate was looked up by.
        vehicle: VehicleType,

        /// [`duty::Kind`] the rate was looked up by.
        kind: duty::Kind,
    },

    /// Base rate of a local use duty.
    #[display(
        "no {party} local use rate for `{package}` package and `{vehicle}` \
         vehicle"
    )]
    LocalUse {
        /// [`Party`] the rate is billed to.
        #[error(not(source))]
        party: Party,

        /// [`PackageCode`] the rate was looked up by.
        package: PackageCode,

        /// [`VehicleType`] the rate was looked up by.
        vehicle: VehicleType,
    },
}
