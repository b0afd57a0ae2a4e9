//! Rate tables the [`Charges`] are calculated from.
//!
//! [`Charges`]: crate::domain::charge::Charges

use std::collections::HashMap;

use common::Money;
use derive_more::{Display, Error};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::{charge::Party, duty, setting, Setting};

define_text! {
    #[doc = "Type of a vehicle (`Sedan`, `SUV`, etc.) rates are keyed by."]
    struct VehicleType(max = 128);
}

define_text! {
    #[doc = "Code of a local use package (`4H-40K`, etc.) rates are keyed by."]
    struct PackageCode(max = 128);
}

/// Base rates keyed by [`VehicleType`] and [`duty::Kind`].
pub type BaseRates = HashMap<VehicleType, HashMap<duty::Kind, Money>>;

/// Local use rates keyed by [`PackageCode`] and [`VehicleType`].
pub type LocalUseRates = HashMap<PackageCode, HashMap<VehicleType, Money>>;

/// Stored local use rates keyed by [`PackageCode`] and [`VehicleType`].
pub type LocalUseDocument =
    HashMap<PackageCode, HashMap<VehicleType, LocalUseRate>>;

/// Extra usage rates keyed by [`VehicleType`].
pub type ExtraRates = HashMap<VehicleType, ExtraRate>;

/// Rates of the usage beyond what a package includes.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraRate {
    /// Rate of every additional kilometer.
    #[serde(default)]
    pub per_km: Money,

    /// Rate of every additional hour.
    #[serde(default)]
    pub per_hour: Money,
}

impl ExtraRate {
    /// Returns the charge of the provided additional usage.
    ///
    /// [`None`] is returned if the charge overflows.
    #[must_use]
    pub fn charge(&self, km: Decimal, hours: Decimal) -> Option<Money> {
        self.per_km
            .checked_mul(km)?
            .checked_add(self.per_hour.checked_mul(hours)?)
    }
}

/// Stored local use rate of a vehicle within a package.
///
/// The guest side reads `guestCharge` out of the `localUseCharges` setting,
/// while the backend side reads `backendCharge` out of the
/// `backendLocalUseCharges` one.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUseRate {
    /// Rate billed to the guest.
    pub guest_charge: Option<Money>,

    /// Rate paid by the backend.
    pub backend_charge: Option<Money>,
}

impl LocalUseRate {
    /// Returns the rate billed to the provided [`Party`], if any.
    #[must_use]
    pub fn of(&self, party: Party) -> Option<Money> {
        match party {
            Party::Guest => self.guest_charge,
            Party::Backend => self.backend_charge,
        }
    }
}

/// Local use package describing what the base rate includes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Package {
    /// [`PackageCode`] of this [`Package`].
    pub label: PackageCode,

    /// Hours included into this [`Package`].
    #[serde(default)]
    pub hours: Decimal,

    /// Kilometers included into this [`Package`].
    #[serde(default)]
    pub kms: Decimal,
}

/// Vehicle type listed in the `vehicleTypes` setting.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Vehicle {
    /// [`VehicleType`] rates are keyed by.
    #[serde(rename = "type")]
    pub kind: VehicleType,

    /// Human-readable label.
    pub label: String,
}

/// Rates billed to a single [`Party`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Side {
    /// Base rates of point-to-point duties.
    pub base: BaseRates,

    /// Base rates of local use duties.
    pub local_use: LocalUseRates,

    /// Rates of the usage beyond a local use package.
    pub extra: ExtraRates,
}

impl Side {
    /// Looks up the base rate of a point-to-point duty.
    #[must_use]
    pub fn base(&self, vehicle: &VehicleType, kind: &duty::Kind) -> Option<Money> {
        self.base.get(vehicle)?.get(kind).copied()
    }

    /// Looks up the base rate of a local use duty.
    #[must_use]
    pub fn local_use(
        &self,
        package: &PackageCode,
        vehicle: &VehicleType,
    ) -> Option<Money> {
        self.local_use.get(package)?.get(vehicle).copied()
    }

    /// Looks up the [`ExtraRate`] of a vehicle.
    #[must_use]
    pub fn extra(&self, vehicle: &VehicleType) -> Option<ExtraRate> {
        self.extra.get(vehicle).copied()
    }
}

/// Consistent snapshot of all the rate tables.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tables {
    /// Rates billed to a guest.
    pub guest: Side,

    /// Rates billed to the backend.
    pub backend: Side,

    /// Informational guest rates of duties being a part of a stay package.
    pub part_of_package: BaseRates,

    /// Local use [`Package`]s.
    pub packages: Vec<Package>,
}

impl Tables {
    /// Returns the [`Side`] of rates billed to the provided [`Party`].
    #[must_use]
    pub fn side(&self, party: Party) -> &Side {
        match party {
            Party::Guest => &self.guest,
            Party::Backend => &self.backend,
        }
    }

    /// Looks up the part of package rate.
    #[must_use]
    pub fn part_of_package(
        &self,
        vehicle: &VehicleType,
        kind: &duty::Kind,
    ) -> Option<Money> {
        self.part_of_package.get(vehicle)?.get(kind).copied()
    }

    /// Looks up the local use [`Package`] by its [`PackageCode`].
    #[must_use]
    pub fn package(&self, code: &PackageCode) -> Option<&Package> {
        self.packages.iter().find(|p| &p.label == code)
    }

    /// Parses [`Tables`] out of the provided [`Setting`]s.
    ///
    /// Absent [`Setting`]s result in empty tables.
    ///
    /// # Errors
    ///
    /// If any of the [`Setting`]s has malformed values.
    pub fn from_settings(
        settings: &HashMap<setting::Key, Setting>,
    ) -> Result<Self, ParseError> {
        use setting::Key as K;

        Ok(Self {
            guest: Side {
                base: parse(settings, K::GuestCharges)?,
                local_use: local_use(settings, K::LocalUseCharges, Party::Guest)?,
                extra: parse(settings, K::GuestExtraCharges)?,
            },
            backend: Side {
                base: parse(settings, K::BackendCharges)?,
                local_use: local_use(
                    settings,
                    K::BackendLocalUseCharges,
                    Party::Backend,
                )?,
                extra: parse(settings, K::BackendExtraCharges)?,
            },
            part_of_package: parse(settings, K::PopCharges)?,
            packages: parse(settings, K::LocalUsePackages)?,
        })
    }
}

/// Checks that the provided `values` have the shape expected for the
/// [`setting::Key`].
///
/// # Errors
///
/// If the `values` are malformed.
pub fn validate(
    key: setting::Key,
    values: &serde_json::Value,
) -> Result<(), ParseError> {
    use setting::Key as K;

    match key {
        K::DutyTypes => check::<Vec<duty::Kind>>(key, values),
        K::VehicleTypes => check::<Vec<Vehicle>>(key, values),
        K::LocalUsePackages => check::<Vec<Package>>(key, values),
        K::GuestCharges | K::BackendCharges | K::PopCharges => {
            check::<BaseRates>(key, values)
        }
        K::LocalUseCharges | K::BackendLocalUseCharges => {
            check::<LocalUseDocument>(key, values)
        }
        K::GuestExtraCharges | K::BackendExtraCharges => {
            check::<ExtraRates>(key, values)
        }
    }
}

/// Checks that the `values` deserialize into a `T`.
fn check<T: DeserializeOwned>(
    key: setting::Key,
    values: &serde_json::Value,
) -> Result<(), ParseError> {
    T::deserialize(values)
        .map(drop)
        .map_err(|source| ParseError { key, source })
}

/// Parses the [`Setting`] with the provided [`setting::Key`], if any.
fn parse<T: DeserializeOwned + Default>(
    settings: &HashMap<setting::Key, Setting>,
    key: setting::Key,
) -> Result<T, ParseError> {
    settings.get(&key).map_or_else(
        || Ok(T::default()),
        |s| T::deserialize(&s.values).map_err(|source| ParseError { key, source }),
    )
}

/// Parses the local use [`Setting`] with the provided [`setting::Key`] into
/// the [`LocalUseRates`] of the provided [`Party`].
///
/// Vehicles without a rate of the [`Party`] are omitted.
fn local_use(
    settings: &HashMap<setting::Key, Setting>,
    key: setting::Key,
    party: Party,
) -> Result<LocalUseRates, ParseError> {
    let document: LocalUseDocument = parse(settings, key)?;
    Ok(document
        .into_iter()
        .map(|(package, vehicles)| {
            let rates = vehicles
                .into_iter()
                .filter_map(|(vehicle, rate)| Some((vehicle, rate.of(party)?)))
                .collect();
            (package, rates)
        })
        .collect())
}

/// Error of parsing [`Tables`] out of [`Setting`]s.
#[derive(Debug, Display, Error)]
#[display("`{key}` setting is malformed: {source}")]
pub struct ParseError {
    /// [`setting::Key`] of the malformed [`Setting`].
    pub key: setting::Key,

    /// Underlying deserialization error.
    pub source: serde_json::Error,
}
