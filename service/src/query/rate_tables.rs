//! [`RateTables`] [`Query`].

use std::collections::HashMap;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{rate, setting, Setting},
    infra::{database, Database},
    Service,
};

use super::Query;

/// [`Query`] loading a consistent snapshot of the [`rate::Tables`].
///
/// All the [`Setting`]s are read at once, so the snapshot never mixes rates
/// of different configuration states.
#[derive(Clone, Copy, Debug)]
pub struct RateTables;

impl<Db> Query<RateTables> for Service<Db>
where
    Db: Database<
        Select<By<HashMap<setting::Key, Setting>, ()>>,
        Ok = HashMap<setting::Key, Setting>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = rate::Tables;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: RateTables) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let settings = self
            .database()
            .execute(Select(By::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        rate::Tables::from_settings(&settings)
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`RateTables`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Setting`] holds malformed rates.
    #[display("{_0}")]
    MalformedSetting(rate::ParseError),
}
