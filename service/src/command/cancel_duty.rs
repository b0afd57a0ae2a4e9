//! [`Command`] for cancelling a [`Duty`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        activity,
        duty::{self, Status},
        user::Actor,
        Duty,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`Duty`].
#[derive(Clone, Debug)]
pub struct CancelDuty {
    /// ID of the [`Duty`] to cancel.
    pub duty_id: duty::Id,

    /// Reason of the cancellation.
    pub reason: String,

    /// [`Actor`] cancelling the [`Duty`].
    pub actor: Actor,
}

impl<Db> Command<CancelDuty> for Service<Db>
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

    async fn execute(&self, cmd: CancelDuty) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelDuty {
            duty_id,
            reason,
            actor,
        } = cmd;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(tracerr::new!(E::ReasonRequired));
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

        if duty.status.is_final() {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }

        duty.cancellation_reason = Some(reason.to_owned());
        duty.set_status(Status::Cancelled);

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            format!("Cancelled duty (Reason: {reason})"),
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("cancelled `{}` duty: {reason}", duty.trip_id);

        Ok(duty)
    }
}

/// Error of [`CancelDuty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Duty`] with the provided ID does not exist.
    #[display("`Duty(id: {_0})` does not exist")]
    DutyNotExists(#[error(not(source))] duty::Id),

    /// Cancellation reason is blank.
    #[display("Cancellation reason is required")]
    ReasonRequired,

    /// [`Duty`] is already finished.
    #[display("`Duty` cannot be cancelled being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::spec::{actor, duty_in, service, stored},
        domain::{
            duty::{self, Kind, Status},
            user::Role,
        },
        Command as _,
    };

    use super::{CancelDuty, ExecutionError};

    fn cancel(duty_id: duty::Id, reason: &str) -> CancelDuty {
        CancelDuty {
            duty_id,
            reason: reason.to_owned(),
            actor: actor(Role::Concierge),
        }
    }

    #[tokio::test]
    async fn cancels_with_reason() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::AirportPickup, Status::Active).await;

        let cancelled = svc
            .execute(cancel(duty.id, "  Flight delayed "))
            .await
            .unwrap();

        assert_eq!(cancelled.status, Status::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("Flight delayed"),
        );
        assert_eq!(stored(&svc, duty.id).await, cancelled);
    }

    #[tokio::test]
    async fn requires_reason() {
        let svc = service().await;
        let duty = duty_in(&svc, Kind::AirportPickup, Status::Pending).await;

        let err = svc.execute(cancel(duty.id, "   ")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ReasonRequired));
        assert_eq!(stored(&svc, duty.id).await.status, Status::Pending);
    }

    #[tokio::test]
    async fn rejects_finished_duty() {
        let svc = service().await;

        for status in [Status::Completed, Status::Cancelled] {
            let duty = duty_in(&svc, Kind::AirportPickup, status).await;

            let err = svc.execute(cancel(duty.id, "Late")).await.unwrap_err();

            assert!(matches!(
                err.as_ref(),
                ExecutionError::WrongStatus(s) if *s == status,
            ));
        }
    }

    #[tokio::test]
    async fn rejects_unknown_duty() {
        let svc = service().await;

        let err = svc
            .execute(cancel(duty::Id::new(), "Late"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::DutyNotExists(_)));
    }
}
