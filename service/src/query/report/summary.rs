//! [`Summary`] report definition.

use std::{collections::HashMap, ops::RangeInclusive, time::Duration};

use common::{
    define_kind,
    operations::{By, Select},
    DateTime, Money,
};
use serde::Serialize;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::charge::Charges;
use crate::{
    domain::{
        duty::{self, Status},
        rate::{PackageCode, VehicleType},
        Duty,
    },
    infra::{database, Database},
    read::duty::list::{Filter, Order, Selector},
    Query, Service,
};

define_kind! {
    #[doc = "Reporting period of a [`Summary`]."]
    enum Range {
        #[doc = "Current day."]
        Today = 1 => "today",

        #[doc = "Previous day."]
        Yesterday = 2 => "yesterday",

        #[doc = "Current month up to the end of the current day."]
        MonthToDate = 3 => "mtd",

        #[doc = "Current year up to the end of the current day."]
        YearToDate = 4 => "ytd",
    }
}

impl Range {
    /// Returns the inclusive bounds of this [`Range`] relative to the
    /// provided moment, by UTC day boundaries.
    #[must_use]
    pub fn bounds(self, now: DateTime) -> RangeInclusive<DateTime> {
        const DAY: Duration = Duration::from_secs(24 * 60 * 60);
        const TICK: Duration = Duration::from_micros(1);

        let today = now.start_of_day();
        let end_of_today = today + DAY - TICK;
        match self {
            Self::Today => today..=end_of_today,
            Self::Yesterday => (today - DAY)..=(today - TICK),
            Self::MonthToDate => now.start_of_month()..=end_of_today,
            Self::YearToDate => now.start_of_year()..=end_of_today,
        }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::Today
    }
}

/// [`Query`] summarizing revenue of the completed [`Duty`]s picked up within
/// a [`Range`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// [`Range`] of the pickup time.
    pub range: Range,

    /// [`duty::Kind`] to summarize only.
    pub kind: Option<duty::Kind>,

    /// [`VehicleType`] to summarize only.
    pub vehicle_type: Option<VehicleType>,

    /// [`PackageCode`] to summarize only.
    ///
    /// Considered only along with the [`duty::Kind::LocalUse`] `kind`.
    pub package_code: Option<PackageCode>,
}

/// Output of the [`Summary`] [`Query`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    /// Rows of the report, earliest pickup first.
    pub rows: Vec<Row>,

    /// [`Totals`] by [`duty::Kind`].
    pub by_duty_type: HashMap<duty::Kind, Totals>,

    /// [`Totals`] of all the [`Row`]s.
    pub grand_total: Totals,
}

/// Row in the [`Output`] of the [`Summary`] [`Query`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Trip ID of the summarized [`Duty`].
    pub trip_id: duty::TripId,

    /// Pickup date in `DD-MM-YYYY` format.
    pub date: String,

    /// [`duty::Kind`] of the [`Duty`].
    #[serde(rename = "dutyType")]
    pub kind: duty::Kind,

    /// [`VehicleType`] of the [`Duty`].
    pub vehicle_type: VehicleType,

    /// [`PackageCode`] of the [`Duty`], if any.
    pub package: Option<PackageCode>,

    /// Total billed to the guest.
    pub guest_total: Money,

    /// Total paid to the backend.
    pub backend_total: Money,
}

impl From<&Duty> for Row {
    fn from(duty: &Duty) -> Self {
        let date = duty.pickup_at.date();
        Self {
            trip_id: duty.trip_id.clone(),
            date: format!(
                "{:02}-{:02}-{}",
                date.day(),
                u8::from(date.month()),
                date.year(),
            ),
            kind: duty.kind.clone(),
            vehicle_type: duty.vehicle_type.clone(),
            package: duty.package_code.clone(),
            guest_total: duty.charges.guest.total,
            backend_total: duty.charges.backend.total,
        }
    }
}

/// Totals of multiple [`Row`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of the guest [`Charges`].
    pub guest_total: Money,

    /// Sum of the backend [`Charges`].
    pub backend_total: Money,

    /// Difference between the guest and backend totals.
    pub profit: Money,
}

impl Totals {
    /// Adds the provided [`Row`] to these [`Totals`].
    pub fn add(&mut self, row: &Row) {
        self.guest_total += row.guest_total;
        self.backend_total += row.backend_total;
        self.profit = self.guest_total - self.backend_total;
    }
}

impl<Db> Query<Summary> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Duty>, Selector>>,
        Ok = Vec<Duty>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Summary {
            range,
            kind,
            vehicle_type,
            package_code,
        }: Summary,
    ) -> Result<Self::Ok, Self::Err> {
        let package_code =
            package_code.filter(|_| kind == Some(duty::Kind::LocalUse));

        let duties = self
            .database()
            .execute(Select(By::new(Selector {
                filter: Filter {
                    statuses: vec![Status::Completed],
                    pickup: Some(range.bounds(DateTime::now())),
                    kind,
                    vehicle_type,
                    package_code,
                    ..Filter::default()
                },
                order: Order::PickupAscending,
            })))
            .await
            .map_err(tracerr::wrap!())?;

        let mut output = Output::default();
        for row in duties.iter().map(Row::from) {
            output
                .by_duty_type
                .entry(row.kind.clone())
                .or_default()
                .add(&row);
            output.grand_total.add(&row);
            output.rows.push(row);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Update, DateTime, Money};

    use crate::{
        command::spec::{duty_in, service},
        domain::{
            duty::{Kind, Status},
            rate::PackageCode,
        },
        infra::Database as _,
        Query as _,
    };

    use super::{Range, Summary, Totals};

    #[test]
    fn bounds_ranges() {
        let now = DateTime::from_rfc3339("2025-03-15T10:00:00Z").unwrap();
        let at = |s| DateTime::from_rfc3339(s).unwrap();

        assert_eq!(
            Range::Today.bounds(now),
            at("2025-03-15T00:00:00Z")..=at("2025-03-15T23:59:59.999999Z"),
        );
        assert_eq!(
            Range::Yesterday.bounds(now),
            at("2025-03-14T00:00:00Z")..=at("2025-03-14T23:59:59.999999Z"),
        );
        assert_eq!(
            *Range::MonthToDate.bounds(now).start(),
            at("2025-03-01T00:00:00Z"),
        );
        assert_eq!(
            *Range::YearToDate.bounds(now).start(),
            at("2025-01-01T00:00:00Z"),
        );
        assert_eq!("mtd".parse::<Range>(), Ok(Range::MonthToDate));
    }

    #[tokio::test]
    async fn totals_completed_duties() {
        let svc = service().await;
        let pickup = duty_in(&svc, Kind::AirportPickup, Status::Completed).await;
        let drop = duty_in(&svc, Kind::AirportDrop, Status::Completed).await;
        _ = duty_in(&svc, Kind::LocalUse, Status::Completed).await;
        _ = duty_in(&svc, Kind::AirportPickup, Status::PendingVerificationConcierge)
            .await;
        let mut old = duty_in(&svc, Kind::AirportPickup, Status::Completed).await;
        old.pickup_at = DateTime::now().start_of_day() - Duration::from_secs(1);
        svc.database().execute(Update(old)).await.unwrap();

        let report = svc.execute(Summary::default()).await.unwrap();

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].trip_id, pickup.trip_id);
        assert_eq!(report.rows[1].trip_id, drop.trip_id);
        assert_eq!(
            report.by_duty_type[&Kind::AirportPickup],
            Totals {
                guest_total: Money::from(4480),
                backend_total: Money::from(3360),
                profit: Money::from(1120),
            },
        );
        assert_eq!(
            report.grand_total,
            Totals {
                guest_total: Money::from(4480 + 3136 + 2240),
                backend_total: Money::from(3360 + 2800 + 1680),
                profit: Money::from(1120 + 336 + 560),
            },
        );
    }

    #[tokio::test]
    async fn filters_package_of_local_use_only() {
        let svc = service().await;
        _ = duty_in(&svc, Kind::LocalUse, Status::Completed).await;
        _ = duty_in(&svc, Kind::AirportDrop, Status::Completed).await;

        let unknown = Some(PackageCode::new("8H-80K").unwrap());
        let local = svc
            .execute(Summary {
                kind: Some(Kind::LocalUse),
                package_code: unknown.clone(),
                ..Summary::default()
            })
            .await
            .unwrap();
        let drops = svc
            .execute(Summary {
                kind: Some(Kind::AirportDrop),
                package_code: unknown,
                ..Summary::default()
            })
            .await
            .unwrap();

        assert!(local.rows.is_empty());
        assert_eq!(drops.rows.len(), 1);
        assert_eq!(drops.grand_total.profit, Money::from(336));
    }
}
