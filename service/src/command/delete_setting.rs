//! [`Command`] for deleting a [`Setting`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{setting, user::Actor, Setting},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Setting`].
///
/// Rates of a deleted [`Setting`] are treated as absent afterwards.
#[derive(Clone, Debug)]
pub struct DeleteSetting {
    /// [`setting::Key`] of the [`Setting`] to delete.
    pub key: setting::Key,

    /// [`Actor`] deleting the [`Setting`].
    pub actor: Actor,
}

impl<Db> Command<DeleteSetting> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Setting, setting::Key>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Setting>, setting::Key>>,
            Ok = Option<Setting>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Setting, setting::Key>>,
            Err = Traced<database::Error>,
        > + Database<Insert<setting::Change>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Setting;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteSetting) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteSetting { key, actor } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Setting, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let setting = tx
            .execute(Select(By::<Option<Setting>, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::SettingNotExists(key)))?;

        tx.execute(Delete(By::<Setting, _>::new(key)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(setting::Change {
            key,
            action: setting::Action::Delete,
            from: Some(setting.values.clone()),
            to: None,
            updated_by: actor.id,
            at: DateTime::now(),
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("deleted `{key}` setting");

        Ok(setting)
    }
}

/// Error of [`DeleteSetting`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Actor`] is not an administrator.
    #[display("Only administrators can manage settings")]
    NotAdmin,

    /// [`Setting`] with the provided [`setting::Key`] does not exist.
    #[display("`{_0}` setting does not exist")]
    SettingNotExists(#[error(not(source))] setting::Key),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::spec::{actor, create_duty, service},
        domain::{duty::Kind, setting, user::Role, Setting},
        infra::Database as _,
        read, Command as _,
    };

    use super::{DeleteSetting, ExecutionError};

    #[tokio::test]
    async fn deletes_and_logs_change() {
        let svc = service().await;

        let deleted = svc
            .execute(DeleteSetting {
                key: setting::Key::BackendCharges,
                actor: actor(Role::Admin),
            })
            .await
            .unwrap();

        assert_eq!(deleted.key, setting::Key::BackendCharges);
        assert_eq!(
            svc.database()
                .execute(Select(By::<Option<Setting>, _>::new(
                    setting::Key::BackendCharges,
                )))
                .await
                .unwrap(),
            None,
        );

        let changes = svc
            .database()
            .execute(Select(By::<Vec<setting::Change>, _>::new(
                read::setting::changes::Limit::default(),
            )))
            .await
            .unwrap();
        assert_eq!(changes[0].action, setting::Action::Delete);
        assert_eq!(changes[0].from, Some(deleted.values));
        assert_eq!(changes[0].to, None);

        let err = svc
            .execute(create_duty(Kind::AirportPickup))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no backend rate"));
    }

    #[tokio::test]
    async fn rejects_absent_key() {
        let svc = service().await;

        let err = svc
            .execute(DeleteSetting {
                key: setting::Key::VehicleTypes,
                actor: actor(Role::Admin),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::SettingNotExists(setting::Key::VehicleTypes),
        ));
    }

    #[tokio::test]
    async fn allows_admins_only() {
        let svc = service().await;

        let err = svc
            .execute(DeleteSetting {
                key: setting::Key::PopCharges,
                actor: actor(Role::Transport),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin));
    }
}
