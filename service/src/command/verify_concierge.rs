//! [`Command`] for the final verification of a [`Duty`] by the concierge
//! desk.

use std::collections::HashMap;

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        activity,
        charge::CalculationError,
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

/// [`Command`] for the final verification of a [`Duty`] by the concierge
/// desk, completing it.
#[derive(Clone, Debug)]
pub struct VerifyConcierge {
    /// ID of the [`Duty`] to verify.
    pub duty_id: duty::Id,

    /// Final discount for the guest.
    pub discount: Percent,

    /// Remark justifying the `discount`.
    pub discount_remark: String,

    /// [`Actor`] verifying the [`Duty`].
    pub actor: Actor,
}

impl<Db> Command<VerifyConcierge> for Service<Db>
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
        cmd: VerifyConcierge,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let VerifyConcierge {
            duty_id,
            discount,
            discount_remark,
            actor,
        } = cmd;

        let tables = self
            .execute(RateTables)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid completing the same `Duty` twice.
        tx.execute(Lock(By::<Duty, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut duty = tx
            .execute(Select(By::<Option<Duty>, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::DutyNotExists(duty_id)))?;

        if duty.status != Status::PendingVerificationConcierge {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }

        duty.discount = discount;
        duty.discount_remark = discount_remark;
        let charges = duty
            .recalculate(&tables, true)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!(
            "calculated final charges of `{}` duty: {charges:?}",
            duty.trip_id,
        );

        duty.set_status(Status::Completed);

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            format!("Verified & Completed Duty {}", duty.trip_id),
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "completed `{}` duty billing {} to the guest",
            duty.trip_id,
            duty.discounted_price,
        );

        Ok(duty)
    }
}

/// Error of [`VerifyConcierge`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Charges`] cannot be calculated.
    ///
    /// [`Charges`]: crate::domain::charge::Charges
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

    /// [`Duty`] does not await the concierge desk verification.
    #[display("`Duty` cannot be verified by concierge being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}
