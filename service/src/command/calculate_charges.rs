//! [`Command`] for calculating [`Charges`] of a [`Duty`] out of the provided
//! verification inputs.

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
        charge::{self, CalculationError, Charges},
        duty::{self, Status},
        expense, setting,
        user::Actor,
        Duty, Setting,
    },
    infra::{database, Database},
    query::{rate_tables, RateTables},
    Query as _, Service,
};

use super::Command;

/// [`Command`] for calculating [`Charges`] of a [`Duty`] out of the provided
/// verification inputs, without changing its [`Status`].
///
/// Reported expenses are reconciled against the `verified_expenses`.
#[derive(Clone, Debug)]
pub struct CalculateCharges {
    /// ID of the [`Duty`] to calculate [`Charges`] of.
    pub duty_id: duty::Id,

    /// [`charge::Usage`] beyond the package.
    pub usage: charge::Usage,

    /// Discount for the guest.
    pub discount: Percent,

    /// Remark justifying the `discount`.
    pub discount_remark: String,

    /// Indicator whether the `discount` should be applied.
    pub apply_discount: bool,

    /// Reported expenses allocated to the billed parties.
    pub verified_expenses: Vec<expense::Verified>,

    /// [`Actor`] calculating the [`Charges`].
    pub actor: Actor,
}

impl<Db> Command<CalculateCharges> for Service<Db>
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
        cmd: CalculateCharges,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CalculateCharges {
            duty_id,
            usage,
            discount,
            discount_remark,
            apply_discount,
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

        if duty.status == Status::Cancelled {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }

        duty.usage = usage;
        duty.discount = discount;
        duty.discount_remark = discount_remark;
        duty.expenses.reconcile(&verified_expenses);
        duty.verified_expenses = verified_expenses;

        let charges = duty
            .recalculate(&tables, apply_discount)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!("calculated charges of `{}` duty: {charges:?}", duty.trip_id);

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(
            &actor,
            duty_id,
            format!(
                "Calculated charges: guest {}, backend {}",
                charges.guest.total, charges.backend.total,
            ),
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

/// Error of [`CalculateCharges`] [`Command`] execution.
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

    /// Provided verified expenses are invalid.
    #[display("Invalid input: {_0}")]
    InvalidInput(#[error(not(source))] &'static str),

    /// [`rate::Tables`] cannot be loaded.
    ///
    /// [`rate::Tables`]: crate::domain::rate::Tables
    #[display("Failed to load rate tables: {_0}")]
    #[from]
    Rates(rate_tables::ExecutionError),

    /// [`Duty`] is cancelled.
    #[display("`Duty` charges cannot be calculated being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}
