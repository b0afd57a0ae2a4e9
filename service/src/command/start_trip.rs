//! [`Command`] for starting the trip of a [`Duty`].

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
        duty::{self, Status},
        user::{Actor, Role},
        Duty,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for starting the trip of a [`Duty`].
#[derive(Clone, Debug)]
pub struct StartTrip {
    /// ID of the [`Duty`] to start.
    pub duty_id: duty::Id,

    /// Odometer reading at the trip start.
    pub start_km: Decimal,

    /// [`Actor`] starting the trip.
    pub actor: Actor,
}

impl<Db> Command<StartTrip> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
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

    async fn execute(&self, cmd: StartTrip) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let StartTrip {
            duty_id,
            start_km,
            actor,
        } = cmd;

        if start_km.is_sign_negative() {
            return Err(tracerr::new!(E::InvalidInput(
                "start km reading cannot be negative",
            )));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Duty, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut duty = tx
            .execute(Select(By::<Option<Duty>, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::DutyNotExists(duty_id)))?;

        if duty.status != Status::Active {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }
        if actor.has_role(Role::Chauffeur) && !duty.is_assigned_to(&actor.name)
        {
            return Err(tracerr::new!(E::NotAssigned(duty_id)));
        }

        duty.start_km = Some(start_km);
        duty.start_time = Some(DateTime::now());
        duty.set_status(Status::InProgress);

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            format!("Started trip {}", duty.trip_id),
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("started `{}` trip at {start_km} km", duty.trip_id);

        Ok(duty)
    }
}

/// Error of [`StartTrip`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Duty`] with the provided ID does not exist.
    #[display("`Duty(id: {_0})` does not exist")]
    DutyNotExists(#[error(not(source))] duty::Id),

    /// Provided trip readings are invalid.
    #[display("Invalid input: {_0}")]
    InvalidInput(#[error(not(source))] &'static str),

    /// Chauffeur starts a [`Duty`] assigned to someone else.
    #[display("`Duty(id: {_0})` is not assigned to the chauffeur")]
    NotAssigned(#[error(not(source))] duty::Id),

    /// [`Duty`] is not ready to start.
    #[display("`Duty` cannot be started being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}

#[cfg(test)]
mod spec {
    use rust_decimal_macros::dec;

    use crate::{
        command::spec::{actor, duty_in, service, stored},
        domain::{
            duty::{Kind, Status},
            user::{Name, Role},
        },
        Command as _,
    };

    use super::{ExecutionError, StartTrip};

    #[tokio::test]
    async fn starts_assigned_trip() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::LocalUse, Status::Active).await;

        let started = svc
            .execute(StartTrip {
                duty_id: duty.id,
                start_km: dec!(1200.5),
                actor: actor(Role::Chauffeur),
            })
            .await
            .unwrap();

        assert_eq!(started.status, Status::InProgress);
        assert_eq!(started.start_km, Some(dec!(1200.5)));
        assert!(started.start_time.is_some());
        assert_eq!(stored(&svc, duty.id).await, started);
    }

    #[tokio::test]
    async fn rejects_other_chauffeur() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::LocalUse, Status::Active).await;
        let mut other = actor(Role::Chauffeur);
        other.name = Name::new("Someone Else").unwrap();

        let err = svc
            .execute(StartTrip {
                duty_id: duty.id,
                start_km: dec!(10),
                actor: other,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAssigned(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_start() {
        let svc = service().await;
        let pending = duty_in(&svc, Kind::LocalUse, Status::Pending).await;
        let active = duty_in(&svc, Kind::LocalUse, Status::Active).await;

        let err = svc
            .execute(StartTrip {
                duty_id: pending.id,
                start_km: dec!(10),
                actor: actor(Role::Transport),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::WrongStatus(Status::Pending),
        ));

        let err = svc
            .execute(StartTrip {
                duty_id: active.id,
                start_km: dec!(-1),
                actor: actor(Role::Transport),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidInput(_)));
    }
}
