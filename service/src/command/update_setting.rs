//! [`Command`] for replacing values of an existing [`Setting`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
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

/// [`Command`] for replacing values of an existing [`Setting`].
#[derive(Clone, Debug)]
pub struct UpdateSetting {
    /// [`setting::Key`] of the [`Setting`] to update.
    pub key: setting::Key,

    /// New values of the [`Setting`].
    pub values: serde_json::Value,

    /// [`Actor`] updating the [`Setting`].
    pub actor: Actor,
}

impl<Db> Command<UpdateSetting> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Setting, setting::Key>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Setting>, setting::Key>>,
            Ok = Option<Setting>,
            Err = Traced<database::Error>,
        > + Database<Update<Setting>, Err = Traced<database::Error>>
        + Database<Insert<setting::Change>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Setting;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateSetting) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateSetting { key, values, actor } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin));
        }
        rate::validate(key, &values).map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid lost updates of the same `Setting`.
        tx.execute(Lock(By::<Setting, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Option<Setting>, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::SettingNotExists(key)))?;

        let setting = Setting {
            values,
            updated_by: actor.id,
            updated_at: DateTime::now(),
            ..existing.clone()
        };
        tx.execute(Update(setting.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(setting::Change {
            key,
            action: setting::Action::Update,
            from: Some(existing.values),
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

        log::info!("updated `{key}` setting");

        Ok(setting)
    }
}

/// Error of [`UpdateSetting`] [`Command`] execution.
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

    /// [`Setting`] with the provided [`setting::Key`] does not exist.
    #[display("`{_0}` setting does not exist")]
    SettingNotExists(#[error(not(source))] setting::Key),
}
