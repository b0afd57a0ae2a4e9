//! [`Duty`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Perform, Select, Update},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{duty, Duty},
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

impl<C> Database<Select<By<Option<Duty>, duty::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Duty>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Duty>, duty::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.view(|v| v.duty(id).cloned()).await)
    }
}

impl<C> Database<Select<By<Vec<Duty>, read::duty::list::Selector>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Duty>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Duty>, read::duty::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::duty::list::Selector { filter, order } = by.into_inner();

        let mut duties = self
            .view(|v| {
                v.duties()
                    .filter(|d| filter.matches(d))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        order.sort(&mut duties);
        Ok(duties)
    }
}

impl<C> Database<Insert<Duty>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(duty): Insert<Duty>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::InsertDuty(duty))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Duty>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(duty): Update<Duty>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::UpdateDuty(duty))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<Duty, duty::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Duty, duty::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(LockKey::Duty(by.into_inner())).await;
        Ok(())
    }
}

impl<C> Database<Perform<By<duty::TripId, DateTime>>> for Memory<C>
where
    C: Connection,
{
    type Ok = duty::TripId;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Perform(by): Perform<By<duty::TripId, DateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let at = by.into_inner();
        let sequence = self.next_trip_sequence(at).await;
        Ok(duty::TripId::new(sequence, at))
    }
}
