//! [`Command`] for verifying a [`Duty`] by the transport desk.

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
        charge::{self, CalculationError},
        duty::{self, Status, UsageRemark},
        expense, setting,
        user::Actor,
        Duty, Setting,
    },
    infra::{database, Database},
    query::{rate_tables, RateTables},
    Query as _, Service,
};

use super::Command;

/// [`Command`] for verifying a [`Duty`] by the transport desk.
#[derive(Clone, Debug)]
pub struct VerifyTransport {
    /// ID of the [`Duty`] to verify.
    pub duty_id: duty::Id,

    /// Verified [`charge::Usage`] beyond the package.
    pub usage: charge::Usage,

    /// Remark justifying the verified [`charge::Usage`].
    pub additional_charges_remark: UsageRemark,

    /// Discount for the guest.
    pub discount: Percent,

    /// Remark justifying the `discount`.
    pub discount_remark: String,

    /// Reported expenses allocated to the billed parties.
    pub verified_expenses: Vec<expense::Verified>,

    /// [`Actor`] verifying the [`Duty`].
    pub actor: Actor,
}

impl<Db> Command<VerifyTransport> for Service<Db>
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
        cmd: VerifyTransport,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let VerifyTransport {
            duty_id,
            usage,
            additional_charges_remark,
            discount,
            discount_remark,
            verified_expenses,
            actor,
        } = cmd;

        if expense::first_negative(&verified_expenses).is_some() {
            return Err(tracerr::new!(E::InvalidInput(
                "verified expense amount is negative",
            )));
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

        tx.execute(Lock(By::<Duty, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut duty = tx
            .execute(Select(By::<Option<Duty>, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::DutyNotExists(duty_id)))?;

        if duty.status != Status::PendingVerificationTransport {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }

        duty.usage = usage;
        duty.additional_charges_remark = additional_charges_remark;
        duty.discount = discount;
        duty.discount_remark = discount_remark;
        duty.expenses.reconcile(&verified_expenses);
        duty.verified_expenses = verified_expenses;

        let charges = duty
            .recalculate(&tables, true)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!(
            "calculated verified charges of `{}` duty: {charges:?}",
            duty.trip_id,
        );

        duty.set_status(Status::PendingVerificationConcierge);

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            format!("Verified Transport Duty {}", duty.trip_id),
        )))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("transport desk verified `{}` duty", duty.trip_id);

        Ok(duty)
    }
}

/// Error of [`VerifyTransport`] [`Command`] execution.
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

    /// Provided verified expenses are invalid.
    #[display("Invalid input: {_0}")]
    InvalidInput(#[error(not(source))] &'static str),

    /// [`rate::Tables`] cannot be loaded.
    ///
    /// [`rate::Tables`]: crate::domain::rate::Tables
    #[display("Failed to load rate tables: {_0}")]
    #[from]
    Rates(rate_tables::ExecutionError),

    /// [`Duty`] does not await the transport desk verification.
    #[display("`Duty` cannot be verified by transport being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}
