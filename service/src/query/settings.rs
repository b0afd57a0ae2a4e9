//! [`Query`] collection related to the multiple [`Setting`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::{
    domain::{setting, Setting},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all the stored [`Setting`]s.
pub type All = DatabaseQuery<By<HashMap<setting::Key, Setting>, ()>>;

/// Queries the latest [`setting::Change`]s, newest first.
pub type Changes =
    DatabaseQuery<By<Vec<setting::Change>, read::setting::changes::Limit>>;
