//! [`Command`] for recalculating [`Charges`] of a [`Duty`].

use std::collections::HashMap;

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        activity,
        charge::{CalculationError, Charges},
        duty::{self, Status},
        setting,
        user::Actor,
        Duty, Setting,
    },
    infra::{database, Database},
    query::{rate_tables, RateTables},
    Query as _, Service,
};

use super::Command;

/// [`Command`] for recalculating [`Charges`] of a [`Duty`] out of its stored
/// inputs by the current rates.
///
/// The stored discount is applied whenever it's non-zero.
#[derive(Clone, Debug)]
pub struct RecalculateCharges {
    /// ID of the [`Duty`] to recalculate [`Charges`] of.
    pub duty_id: duty::Id,

    /// [`Actor`] recalculating the [`Charges`].
    pub actor: Actor,
}

impl<Db> Command<RecalculateCharges> for Service<Db>
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

    async fn execute(
        &self,
        cmd: RecalculateCharges,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecalculateCharges { duty_id, actor } = cmd;

        let tables = self
            .execute(RateTables)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

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

        if duty.status == Status::Cancelled {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }

        let apply_discount = !duty.discount.is_zero();
        let charges = duty
            .recalculate(&tables, apply_discount)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!(
            "recalculated charges of `{}` duty: {charges:?}",
            duty.trip_id,
        );

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            "Recalculated charges",
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(duty)
    }
}

/// Error of [`RecalculateCharges`] [`Command`] execution.
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

    /// [`Duty`] with the provided ID does not exist.
    #[display("`Duty(id: {_0})` does not exist")]
    DutyNotExists(#[error(not(source))] duty::Id),

    /// [`rate::Tables`] cannot be loaded.
    ///
    /// [`rate::Tables`]: crate::domain::rate::Tables
    #[display("Failed to load rate tables: {_0}")]
    #[from]
    Rates(rate_tables::ExecutionError),

    /// [`Duty`] is cancelled.
    #[display("`Duty` charges cannot be recalculated being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}
