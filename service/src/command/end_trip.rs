//! [`Command`] for ending the trip of a [`Duty`].

use std::{collections::HashMap, time::Duration};

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        activity,
        charge::{self, CalculationError, NegativeUsage},
        duty::{self, Status},
        expense,
        rate::Tables,
        setting,
        user::Actor,
        Duty, Setting,
    },
    infra::{database, Database},
    query::{rate_tables, RateTables},
    Query as _, Service,
};

use super::Command;

/// [`Command`] for ending the trip of a [`Duty`].
///
/// The usage beyond what the local use package includes is derived from the
/// trip readings, and the [`Duty`] awaits a verification afterwards.
#[derive(Clone, Debug)]
pub struct EndTrip {
    /// ID of the [`Duty`] to end.
    pub duty_id: duty::Id,

    /// Odometer reading at the trip end.
    pub end_km: Decimal,

    /// Expenses reported by the chauffeur.
    pub expenses: expense::Ledger,

    /// [`Actor`] ending the trip.
    pub actor: Actor,
}

impl<Db> Command<EndTrip> for Service<Db>
where
    Db: Database<
            Select<By<HashMap<setting::Key, Setting>, ()>>,
            Ok = HashMap<setting::Key, Setting>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Duty, duty::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Duty>, duty::Id>>,
            Ok = Option<Duty>,
            Err = Traced<database::Error>,
        > + Database<Update<Duty>, Err = Traced<database::Error>>
        + Database<Insert<activity::Entry>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Duty;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: EndTrip) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EndTrip {
            duty_id,
            end_km,
            expenses,
            actor,
        } = cmd;

        if let Some(category) = expenses.incomplete() {
            return Err(tracerr::new!(E::IncompleteExpense(category)));
        }

        let tables = self
            .execute(RateTables)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid ending the same trip twice.
        tx.execute(Lock(By::<Duty, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut duty = tx
            .execute(Select(By::<Option<Duty>, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::DutyNotExists(duty_id)))?;

        if duty.status != Status::InProgress {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }
        let (Some(start_km), Some(start_time)) =
            (duty.start_km, duty.start_time)
        else {
            return Err(tracerr::new!(E::InvalidInput(
                "trip has no start readings",
            )));
        };
        if end_km < start_km {
            return Err(tracerr::new!(E::InvalidInput(
                "end km reading is less than the start one",
            )));
        }
        let end_time = DateTime::now();
        if end_time < start_time {
            return Err(tracerr::new!(E::InvalidInput(
                "trip ends before it starts",
            )));
        }

        let (included_km, included_hours) = included(&duty, &tables);
        duty.usage = charge::Usage::new(
            (end_km - start_km - included_km).max(Decimal::ZERO),
            (billable_hours(end_time - start_time) - included_hours)
                .max(Decimal::ZERO),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;
        duty.end_km = Some(end_km);
        duty.end_time = Some(end_time);
        duty.expenses = expenses;
        duty.verified_expenses.clear();

        let charges = duty
            .recalculate(&tables, true)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!("calculated charges of `{}` trip: {charges:?}", duty.trip_id);

        duty.set_status(Status::PendingVerificationTransport);

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            format!("Ended trip {}", duty.trip_id),
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "ended `{}` trip with {} additional km and {} additional hours",
            duty.trip_id,
            duty.usage.km(),
            duty.usage.hours(),
        );

        Ok(duty)
    }
}

/// Returns the kilometers and hours included into the local use package of
/// the provided [`Duty`].
fn included(duty: &Duty, tables: &Tables) -> (Decimal, Decimal) {
    if duty.kind != duty::Kind::LocalUse {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    duty.package_code
        .as_ref()
        .and_then(|code| tables.package(code))
        .map_or((Decimal::ZERO, Decimal::ZERO), |p| (p.kms, p.hours))
}

/// Rounds the provided trip duration up to whole hours.
fn billable_hours(elapsed: Duration) -> Decimal {
    let secs = elapsed.as_secs() + u64::from(elapsed.subsec_nanos() > 0);
    Decimal::from(secs.div_ceil(60 * 60))
}

/// Error of [`EndTrip`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`charge::Charges`] cannot be calculated.
    #[display("Failed to calculate charges: {_0}")]
    #[from]
    Calculation(CalculationError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Duty`] with the provided ID does not exist.
    #[display("`Duty(id: {_0})` does not exist")]
    DutyNotExists(#[error(not(source))] duty::Id),

    /// Reported expense has no amount or receipt.
    #[display("`{_0}` expense requires an amount and a receipt image")]
    IncompleteExpense(#[error(not(source))] expense::Category),

    /// Provided trip readings are invalid.
    #[display("Invalid input: {_0}")]
    InvalidInput(#[error(not(source))] &'static str),

    /// [`rate::Tables`] cannot be loaded.
    ///
    /// [`rate::Tables`]: crate::domain::rate::Tables
    #[display("Failed to load rate tables: {_0}")]
    #[from]
    Rates(rate_tables::ExecutionError),

    /// Derived usage is negative.
    #[display("Invalid usage: {_0}")]
    #[from]
    Usage(NegativeUsage),

    /// Trip of the [`Duty`] is not in progress.
    #[display("`Duty` cannot be ended being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::Money;
    use rust_decimal_macros::dec;

    use crate::{
        command::spec::{actor, duty_in, service, stored},
        domain::{
            duty::{self, Kind, Status},
            expense::{Category, Entry, Expenses, Ledger},
            user::Role,
        },
        Command as _,
    };

    use super::{billable_hours, EndTrip, ExecutionError};

    fn end(duty_id: duty::Id, end_km: u32, expenses: Ledger) -> EndTrip {
        EndTrip {
            duty_id,
            end_km: end_km.into(),
            expenses,
            actor: actor(Role::Chauffeur),
        }
    }

    fn parking(image_ref: &str) -> Ledger {
        Ledger {
            parking: Expenses {
                enabled: true,
                entries: vec![Entry {
                    amount: Money::from(200),
                    remark: "Airport parking".to_owned(),
                    image_ref: image_ref.to_owned(),
                    split: None,
                }],
            },
            ..Ledger::default()
        }
    }

    #[test]
    fn rounds_hours_up() {
        assert_eq!(billable_hours(Duration::ZERO), dec!(0));
        assert_eq!(billable_hours(Duration::from_millis(1)), dec!(1));
        assert_eq!(billable_hours(Duration::from_secs(3600)), dec!(1));
        assert_eq!(billable_hours(Duration::from_secs(3601)), dec!(2));
    }

    #[tokio::test]
    async fn charges_usage_beyond_package() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::LocalUse, Status::InProgress).await;

        let ended = svc
            .execute(end(duty.id, 190, parking("receipts/1.jpg")))
            .await
            .unwrap();

        assert_eq!(ended.status, Status::PendingVerificationTransport);
        assert_eq!(ended.end_km, Some(dec!(190)));
        assert_eq!(ended.usage.km(), dec!(50));
        assert_eq!(ended.usage.hours(), dec!(2));
        assert_eq!(ended.charges.guest.extra, Money::from(1350));
        assert_eq!(ended.charges.guest.total, Money::from(3752));
        assert_eq!(ended.charges.backend.total, Money::from(2688));
        assert_eq!(ended.expenses.total(), Money::from(200));
        assert_eq!(stored(&svc, duty.id).await, ended);
    }

    #[tokio::test]
    async fn records_full_usage_outside_package() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::AirportDrop, Status::InProgress).await;

        let ended = svc
            .execute(end(duty.id, 130, Ledger::default()))
            .await
            .unwrap();

        assert_eq!(ended.usage.km(), dec!(30));
        assert_eq!(ended.usage.hours(), dec!(6));
        assert_eq!(ended.charges.guest.total, Money::from(3136));
    }

    #[tokio::test]
    async fn rejects_rewound_odometer() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::LocalUse, Status::InProgress).await;

        let err = svc
            .execute(end(duty.id, 99, Ledger::default()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidInput(_)));
        assert_eq!(stored(&svc, duty.id).await.status, Status::InProgress);
    }

    #[tokio::test]
    async fn rejects_expense_without_receipt() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::LocalUse, Status::InProgress).await;

        let err = svc
            .execute(end(duty.id, 150, parking(" ")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::IncompleteExpense(Category::Parking),
        ));
    }

    #[tokio::test]
    async fn rejects_not_started_duty() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::LocalUse, Status::Active).await;

        let err = svc
            .execute(end(duty.id, 150, Ledger::default()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::WrongStatus(Status::Active),
        ));
    }
}
