//! [`activity::Entry`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::activity,
    infra::{
        database::{
            self,
            memory::{Connection, Write},
            Memory,
        },
        Database,
    },
    read,
};

impl<C> Database<Insert<activity::Entry>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<activity::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::LogActivity(entry))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<activity::Entry>, read::activity::list::Selector>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<activity::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<activity::Entry>, read::activity::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::activity::list::Selector { duty_id, limit } = by.into_inner();
        Ok(self
            .view(|v| {
                v.activities()
                    .rev()
                    .filter(|e| duty_id.map_or(true, |id| e.duty_id == id))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .await)
    }
}
