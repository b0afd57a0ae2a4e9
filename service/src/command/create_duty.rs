//! [`Command`] for creating a new [`Duty`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Perform, Select, Transact, Transacted},
    DateTime, Money, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        activity,
        charge::{self, CalculationError, Charges},
        duty,
        expense,
        rate::{PackageCode, VehicleType},
        setting,
        user::{self, Actor},
        Duty, Setting,
    },
    infra::{database, Database},
    query::{rate_tables, RateTables},
    Query as _, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Duty`].
#[derive(Clone, Debug)]
pub struct CreateDuty {
    /// [`duty::Guest`] of a new [`Duty`].
    pub guest: duty::Guest,

    /// Pickup [`DateTime`] of a new [`Duty`].
    pub pickup_at: DateTime,

    /// Pickup location of a new [`Duty`].
    pub pickup_location: String,

    /// Drop location of a new [`Duty`].
    pub drop_location: String,

    /// [`VehicleType`] of a new [`Duty`].
    pub vehicle_type: VehicleType,

    /// [`duty::Kind`] of a new [`Duty`].
    pub kind: duty::Kind,

    /// [`PackageCode`] of a new [`duty::Kind::LocalUse`] [`Duty`].
    pub package_code: Option<PackageCode>,

    /// Special request of the [`duty::Guest`].
    pub special_request: String,

    /// [`duty::CarNumber`] of the car assigned in advance.
    pub car_number: Option<duty::CarNumber>,

    /// Name of the chauffeur assigned in advance.
    pub chauffeur_name: Option<user::Name>,

    /// [`charge::Mode`] the [`duty::Guest`] is billed in.
    pub charge_mode: charge::Mode,

    /// Discount for the [`duty::Guest`].
    pub discount: Percent,

    /// Remark justifying the `discount`.
    pub discount_remark: String,

    /// [`Actor`] creating the [`Duty`].
    pub actor: Actor,
}

impl<Db> Command<CreateDuty> for Service<Db>
where
    Db: Database<
            Select<By<HashMap<setting::Key, Setting>, ()>>,
            Ok = HashMap<setting::Key, Setting>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Perform<By<duty::TripId, DateTime>>,
            Ok = duty::TripId,
            Err = Traced<database::Error>,
        > + Database<Insert<Duty>, Err = Traced<database::Error>>
        + Database<Insert<activity::Entry>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Duty;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateDuty) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateDuty {
            guest,
            pickup_at,
            pickup_location,
            drop_location,
            vehicle_type,
            kind,
            package_code,
            special_request,
            car_number,
            chauffeur_name,
            charge_mode,
            discount,
            discount_remark,
            actor,
        } = cmd;

        if kind.as_str().trim().is_empty() {
            return Err(tracerr::new!(E::DutyTypeRequired));
        }
        if kind == duty::Kind::LocalUse && package_code.is_none() {
            return Err(tracerr::new!(E::PackageRequired));
        }

        let tables = self
            .execute(RateTables)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let ctx = charge::Context {
            kind: kind.clone(),
            vehicle_type: vehicle_type.clone(),
            package_code: package_code.clone(),
            usage: charge::Usage::NONE,
            discount,
            apply_discount: !discount.is_zero()
                && charge_mode == charge::Mode::Chargeable,
            mode: charge_mode,
            verified_expenses: Vec::new(),
        };
        let charges = charge::calculate(&ctx, &tables)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!("calculated charges of a new `{kind}` duty: {charges:?}");

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let trip_id = tx
            .execute(Perform(By::<duty::TripId, _>::new(now)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut duty = Duty {
            id: duty::Id::new(),
            trip_id,
            guest,
            pickup_at,
            pickup_location,
            drop_location,
            vehicle_type,
            kind,
            package_code,
            special_request,
            car_number,
            chauffeur_name,
            start_km: None,
            end_km: None,
            start_time: None,
            end_time: None,
            usage: charge::Usage::NONE,
            additional_charges_remark: duty::UsageRemark::default(),
            charge_mode,
            discount,
            discount_remark,
            discounted_price: Money::ZERO,
            verified_expenses: Vec::new(),
            expenses: expense::Ledger::default(),
            charges: Charges::default(),
            status: duty::Status::Pending,
            status_history: Vec::new(),
            cancellation_reason: None,
            created_by: actor.id,
            created_at: now,
        };
        duty.set_status(duty::Status::Pending);
        duty.apply_charges(charges);

        tx.execute(Insert(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty.id,
            format!("Created new duty for {} ({})", duty.guest.name, duty.trip_id),
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("created `Duty(id: {})` as `{}`", duty.id, duty.trip_id);

        Ok(duty)
    }
}

/// Error of [`CreateDuty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Charges`] cannot be calculated.
    #[display("Failed to calculate charges: {_0}")]
    #[from]
    Calculation(CalculationError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`duty::Kind`] is blank.
    #[display("Duty type is required")]
    DutyTypeRequired,

    /// [`duty::Kind::LocalUse`] [`Duty`] has no [`PackageCode`].
    #[display("Local use duty requires a package code")]
    PackageRequired,

    /// [`rate::Tables`] cannot be loaded.
    ///
    /// [`rate::Tables`]: crate::domain::rate::Tables
    #[display("Failed to load rate tables: {_0}")]
    #[from]
    Rates(rate_tables::ExecutionError),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Money, Percent,
    };
    use rust_decimal_macros::dec;

    use crate::{
        command::spec::{create_duty, service, stored},
        domain::{
            activity,
            charge::Mode,
            duty::{Kind, Status},
        },
        infra::Database as _,
        read, Command as _,
    };

    use super::{CreateDuty, ExecutionError};

    #[tokio::test]
    async fn creates_pending_duty_with_charges() {
        let svc = service().await;

        let duty = svc.execute(create_duty(Kind::AirportPickup)).await.unwrap();

        assert_eq!(duty.status, Status::Pending);
        assert_eq!(duty.status_history.len(), 1);
        assert!(duty.trip_id.as_ref().starts_with("TR/01/"));
        assert_eq!(duty.charges.guest.total, Money::from(4480));
        assert_eq!(duty.charges.backend.total, Money::from(3360));
        assert_eq!(duty.discounted_price, Money::from(4480));

        assert_eq!(stored(&svc, duty.id).await, duty);

        let log = svc
            .database()
            .execute(Select(By::<Vec<activity::Entry>, _>::new(
                read::activity::list::Selector {
                    duty_id: Some(duty.id),
                    limit: 10,
                },
            )))
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].action.starts_with("Created new duty for Jane Doe"));
    }

    #[tokio::test]
    async fn numbers_trips_sequentially() {
        let svc = service().await;

        let first = svc.execute(create_duty(Kind::AirportPickup)).await.unwrap();
        let second = svc.execute(create_duty(Kind::AirportDrop)).await.unwrap();

        assert!(first.trip_id.as_ref().starts_with("TR/01/"));
        assert!(second.trip_id.as_ref().starts_with("TR/02/"));
    }

    #[tokio::test]
    async fn discounts_chargeable_duty_only() {
        let svc = service().await;

        let discounted = svc
            .execute(CreateDuty {
                discount: Percent::new(dec!(10)).unwrap(),
                ..create_duty(Kind::AirportPickup)
            })
            .await
            .unwrap();
        assert_eq!(discounted.charges.guest.total, Money::from(4032));
        assert_eq!(discounted.charges.original_guest.total, Money::from(4480));

        let complimentary = svc
            .execute(CreateDuty {
                discount: Percent::new(dec!(10)).unwrap(),
                charge_mode: Mode::Complimentary,
                ..create_duty(Kind::AirportPickup)
            })
            .await
            .unwrap();
        assert_eq!(complimentary.discounted_price, Money::ZERO);
        assert_eq!(complimentary.charges.backend.total, Money::from(3360));
    }

    #[tokio::test]
    async fn rejects_unconfigured_vehicle() {
        let svc = service().await;

        let err = svc
            .execute(CreateDuty {
                vehicle_type: "Limousine".parse().unwrap(),
                ..create_duty(Kind::AirportPickup)
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("`Limousine` vehicle"));
        assert!(matches!(err.as_ref(), ExecutionError::Calculation(_)));
    }

    #[tokio::test]
    async fn requires_package_for_local_use() {
        let svc = service().await;

        let err = svc
            .execute(CreateDuty {
                package_code: None,
                ..create_duty(Kind::LocalUse)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PackageRequired));
    }
}
