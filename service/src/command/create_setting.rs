//! [`Command`] for creating a new [`Setting`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{rate, setting, user::Actor, Setting},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Setting`].
#[derive(Clone, Debug)]
pub struct CreateSetting {
    /// [`setting::Key`] of a new [`Setting`].
    pub key: setting::Key,

    /// Values of a new [`Setting`].
    pub values: serde_json::Value,

    /// [`Actor`] creating the [`Setting`].
    pub actor: Actor,
}

impl<Db> Command<CreateSetting> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Setting, setting::Key>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Setting>, setting::Key>>,
            Ok = Option<Setting>,
            Err = Traced<database::Error>,
        > + Database<Insert<Setting>, Err = Traced<database::Error>>
        + Database<Insert<setting::Change>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Setting;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateSetting) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSetting { key, values, actor } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin));
        }
        rate::validate(key, &values).map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of the same `Setting`.
        tx.execute(Lock(By::<Setting, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Option<Setting>, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::SettingExists(key)));
        }

        let setting = Setting::new(key, values, actor.id);
        tx.execute(Insert(setting.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(setting::Change {
            key,
            action: setting::Action::Create,
            from: None,
            to: Some(setting.values.clone()),
            updated_by: actor.id,
            at: setting.updated_at,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("created `{key}` setting");

        Ok(setting)
    }
}

/// Error of [`CreateSetting`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided values are malformed.
    #[display("Invalid input: {_0}")]
    #[from]
    InvalidInput(rate::ParseError),

    /// [`Actor`] is not an administrator.
    #[display("Only administrators can manage settings")]
    NotAdmin,

    /// [`Setting`] with the provided [`setting::Key`] already exists.
    #[display("`{_0}` setting already exists")]
    SettingExists(#[error(not(source))] setting::Key),
}
