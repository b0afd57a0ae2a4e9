//! [`Query`] collection related to a single [`Setting`].

use common::operations::By;

use crate::domain::{setting, Setting};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Setting`] by its [`setting::Key`].
pub type ByKey = DatabaseQuery<By<Option<Setting>, setting::Key>>;
