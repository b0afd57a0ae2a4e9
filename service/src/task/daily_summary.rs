//! [`DailySummary`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Select, Start},
    DateTime, Money,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{duty, rate::VehicleType, Duty},
    infra::{database, Database},
    read::duty::list::{Filter, Order, Selector},
    Service,
};

use super::Task;

/// Configuration for [`DailySummary`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between summaries.
    pub interval: time::Duration,
}

/// [`Task`] for summarizing [`Duty`]s completed during the current day.
#[derive(Clone, Copy, Debug)]
pub struct DailySummary<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

/// Summary of the [`Duty`]s completed during a day.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Digest {
    /// Revenue billed to the guests.
    pub guest_revenue: Money,

    /// Cost paid to the backend.
    pub backend_cost: Money,

    /// Difference between the `guest_revenue` and `backend_cost`.
    pub profit: Money,

    /// Summarized [`Duty`]s in the order of their completion.
    pub rows: Vec<Row>,
}

/// Row of a [`Digest`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    /// Trip ID of the [`Duty`].
    pub trip_id: duty::TripId,

    /// Name of the guest.
    pub guest: duty::GuestName,

    /// Vehicle of the [`Duty`].
    pub vehicle_type: VehicleType,

    /// Total billed to the guest.
    pub guest_total: Money,

    /// Total paid to the backend.
    pub backend_total: Money,
}

impl FromIterator<Duty> for Digest {
    fn from_iter<I: IntoIterator<Item = Duty>>(duties: I) -> Self {
        let mut digest = Self::default();
        for duty in duties {
            digest.guest_revenue += duty.charges.guest.total;
            digest.backend_cost += duty.charges.backend.total;
            digest.rows.push(Row {
                trip_id: duty.trip_id,
                guest: duty.guest.name,
                vehicle_type: duty.vehicle_type,
                guest_total: duty.charges.guest.total,
                backend_total: duty.charges.backend.total,
            });
        }
        digest.profit = digest.guest_revenue - digest.backend_cost;
        digest
    }
}

impl<Db> Task<Start<By<DailySummary<Self>, Config>>> for Service<Db>
where
    DailySummary<Service<Db>>:
        Task<Perform<()>, Ok = Digest, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<DailySummary<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = DailySummary {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(digest) => {
                    log::info!(
                        "Daily summary: {} completed duties, guest revenue \
                         {}, backend cost {}, profit {}",
                        digest.rows.len(),
                        digest.guest_revenue,
                        digest.backend_cost,
                        digest.profit,
                    );
                    for row in &digest.rows {
                        log::info!(
                            "  {} | {} | {} | {} | {}",
                            row.trip_id,
                            row.guest,
                            row.vehicle_type,
                            row.guest_total,
                            row.backend_total,
                        );
                    }
                }
                Err(e) => log::error!("`task::DailySummary` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<()>> for DailySummary<Service<Db>>
where
    Db: Database<
        Select<By<Vec<Duty>, Selector>>,
        Ok = Vec<Duty>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Digest;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let today = DateTime::now().start_of_day();
        let mut duties = self
            .service
            .database()
            .execute(Select(By::new(Selector {
                filter: Filter {
                    statuses: vec![duty::Status::Completed],
                    ended: Some(today..=DateTime::now()),
                    ..Filter::default()
                },
                order: Order::default(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        duties.sort_by_key(|d| d.end_time);

        Ok(duties.into_iter().collect())
    }
}

/// Error of [`DailySummary`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{Perform, Update},
        DateTime, Money,
    };

    use crate::{
        command::spec::{duty_in, service},
        domain::duty::{Kind, Status},
        infra::Database as _,
        Task as _,
    };

    use super::{Config, DailySummary};

    #[tokio::test]
    async fn digests_duties_completed_today() {
        let svc = service().await;
        let mut ended = Vec::new();
        for kind in [Kind::AirportDrop, Kind::AirportPickup] {
            let mut duty = duty_in(&svc, kind, Status::Completed).await;
            duty.end_time = Some(DateTime::now());
            svc.database().execute(Update(duty.clone())).await.unwrap();
            ended.push(duty);
        }
        let mut stale =
            duty_in(&svc, Kind::AirportPickup, Status::Completed).await;
        stale.end_time =
            Some(DateTime::now().start_of_day() - Duration::from_secs(1));
        svc.database().execute(Update(stale)).await.unwrap();
        _ = duty_in(&svc, Kind::AirportPickup, Status::InProgress).await;

        let task = DailySummary {
            config: Config {
                interval: Duration::from_secs(60),
            },
            service: svc,
        };
        let digest = task.execute(Perform(())).await.unwrap();

        assert_eq!(
            digest.rows.iter().map(|r| &r.trip_id).collect::<Vec<_>>(),
            ended.iter().map(|d| &d.trip_id).collect::<Vec<_>>(),
        );
        assert_eq!(digest.guest_revenue, Money::from(3136 + 4480));
        assert_eq!(digest.backend_cost, Money::from(2800 + 3360));
        assert_eq!(digest.profit, Money::from(336 + 1120));
    }
}
