//! [`Command`] for assigning a car and a chauffeur to a [`Duty`].

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
        user::{self, Actor},
        Duty,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for assigning a car and a chauffeur to a [`Duty`].
///
/// Clearing both of them returns the [`Duty`] to [`Status::Pending`].
#[derive(Clone, Debug)]
pub struct AssignDuty {
    /// ID of the [`Duty`] to assign.
    pub duty_id: duty::Id,

    /// [`duty::CarNumber`] of the assigned car.
    pub car_number: Option<duty::CarNumber>,

    /// Name of the assigned chauffeur.
    pub chauffeur_name: Option<user::Name>,

    /// [`Actor`] assigning the [`Duty`].
    pub actor: Actor,
}

impl<Db> Command<AssignDuty> for Service<Db>
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

    async fn execute(&self, cmd: AssignDuty) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AssignDuty {
            duty_id,
            car_number,
            chauffeur_name,
            actor,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent assignments of the same `Duty`.
        tx.execute(Lock(By::<Duty, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut duty = tx
            .execute(Select(By::<Option<Duty>, _>::new(duty_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::DutyNotExists(duty_id)))?;

        if !matches!(duty.status, Status::Pending | Status::Active) {
            return Err(tracerr::new!(E::WrongStatus(duty.status)));
        }

        let unchanged = duty.car_number == car_number
            && duty.chauffeur_name == chauffeur_name;
        let action = match (&car_number, &chauffeur_name) {
            _ if unchanged => "Updated car/chauffeur assignment".to_owned(),
            (Some(car), Some(name)) => {
                format!("Assigned Car: {car}, Chauffeur: {name}")
            }
            (Some(car), None) => format!("Assigned Car: {car}"),
            (None, Some(name)) => format!("Assigned Chauffeur: {name}"),
            (None, None) => "Cleared car/chauffeur assignment".to_owned(),
        };

        let status = match (&car_number, &chauffeur_name) {
            (Some(_), Some(_)) => Status::Active,
            (None, None) => Status::Pending,
            (Some(_), None) | (None, Some(_)) => duty.status,
        };
        duty.car_number = car_number;
        duty.chauffeur_name = chauffeur_name;
        if status != duty.status {
            duty.set_status(status);
        }

        tx.execute(Update(duty.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(activity::Entry::new(&actor, duty_id, action)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("assigned `{}` duty, now `{}`", duty.trip_id, duty.status);

        Ok(duty)
    }
}

/// Error of [`AssignDuty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Duty`] with the provided ID does not exist.
    #[display("`Duty(id: {_0})` does not exist")]
    DutyNotExists(#[error(not(source))] duty::Id),

    /// [`Duty`] cannot be assigned in its current [`Status`].
    #[display("`Duty` cannot be assigned being `{_0}`")]
    WrongStatus(#[error(not(source))] Status),
}
