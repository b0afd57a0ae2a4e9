//! [`Query`] collection related to the [`activity::Entry`] log.

use common::operations::By;

use crate::{domain::activity, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries the latest [`activity::Entry`]s, newest first.
pub type Log =
    DatabaseQuery<By<Vec<activity::Entry>, read::activity::list::Selector>>;
