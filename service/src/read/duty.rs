//! [`Duty`]-related read definitions.

#[cfg(doc)]
use crate::domain::Duty;

pub mod list {
    //! [`Duty`] list definitions.

    use std::{cmp::Reverse, ops::RangeInclusive};

    use common::DateTime;

    use crate::domain::{
        duty::{self, Status},
        rate::{PackageCode, VehicleType},
        user, Duty,
    };

    /// Filter of the [`Duty`] list.
    ///
    /// Every [`None`] (or empty) criterion matches any [`Duty`].
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    pub struct Filter {
        /// [`Status`]es to match.
        pub statuses: Vec<Status>,

        /// Name of the assigned chauffeur to match.
        pub chauffeur: Option<user::Name>,

        /// Range of the pickup [`DateTime`] to match.
        pub pickup: Option<RangeInclusive<DateTime>>,

        /// Range of the trip end [`DateTime`] to match.
        pub ended: Option<RangeInclusive<DateTime>>,

        /// [`duty::Kind`] to match.
        pub kind: Option<duty::Kind>,

        /// [`VehicleType`] to match.
        pub vehicle_type: Option<VehicleType>,

        /// [`PackageCode`] to match.
        pub package_code: Option<PackageCode>,
    }

    impl Filter {
        /// Checks whether the provided [`Duty`] matches this [`Filter`].
        #[must_use]
        pub fn matches(&self, duty: &Duty) -> bool {
            let within = |range: &Option<RangeInclusive<DateTime>>,
                          at: Option<DateTime>| {
                range
                    .as_ref()
                    .map_or(true, |r| at.is_some_and(|at| r.contains(&at)))
            };

            (self.statuses.is_empty() || self.statuses.contains(&duty.status))
                && self
                    .chauffeur
                    .as_ref()
                    .map_or(true, |c| duty.is_assigned_to(c))
                && within(&self.pickup, Some(duty.pickup_at))
                && within(&self.ended, duty.end_time)
                && self.kind.as_ref().map_or(true, |k| &duty.kind == k)
                && self
                    .vehicle_type
                    .as_ref()
                    .map_or(true, |v| &duty.vehicle_type == v)
                && self
                    .package_code
                    .as_ref()
                    .map_or(true, |p| duty.package_code.as_ref() == Some(p))
        }
    }

    /// Order of the [`Duty`] list.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub enum Order {
        /// Most recently created first.
        #[default]
        NewestFirst,

        /// Earliest pickup first.
        PickupAscending,
    }

    impl Order {
        /// Sorts the provided [`Duty`]s in this [`Order`].
        pub fn sort(self, duties: &mut [Duty]) {
            match self {
                Self::NewestFirst => {
                    duties.sort_by_key(|d| Reverse(d.created_at));
                }
                Self::PickupAscending => duties.sort_by_key(|d| d.pickup_at),
            }
        }
    }

    /// Selector of the [`Duty`] list.
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    pub struct Selector {
        /// [`Filter`] of the list.
        pub filter: Filter,

        /// [`Order`] of the list.
        pub order: Order,
    }
}
