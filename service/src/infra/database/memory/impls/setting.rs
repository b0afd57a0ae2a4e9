//! [`Setting`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{setting, Setting},
    infra::{
        database::{
            self,
            memory::{client::LockKey, Connection, Tx, Write},
            Memory,
        },
        Database,
    },
    read,
};

impl<C> Database<Select<By<Option<Setting>, setting::Key>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Setting>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Setting>, setting::Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        Ok(self.view(|v| v.setting(key).cloned()).await)
    }
}

impl<C> Database<Select<By<HashMap<setting::Key, Setting>, ()>>> for Memory<C>
where
    C: Connection,
{
    type Ok = HashMap<setting::Key, Setting>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<HashMap<setting::Key, Setting>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .view(|v| v.settings().map(|s| (s.key, s.clone())).collect())
            .await)
    }
}

impl<C> Database<Insert<Setting>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(setting): Insert<Setting>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::InsertSetting(setting))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Setting>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(setting): Update<Setting>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::UpdateSetting(setting))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<Setting, setting::Key>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Setting, setting::Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::DeleteSetting(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<Setting, setting::Key>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Setting, setting::Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(LockKey::Setting(by.into_inner())).await;
        Ok(())
    }
}

impl<C> Database<Insert<setting::Change>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(change): Insert<setting::Change>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::LogSettingChange(change))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<Select<By<Vec<setting::Change>, read::setting::changes::Limit>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<setting::Change>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<setting::Change>, read::setting::changes::Limit>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let limit = usize::from(by.into_inner());
        Ok(self
            .view(|v| v.setting_changes().rev().take(limit).cloned().collect())
            .await)
    }
}
