//! [`Query`] collection related to a single [`Duty`].

use common::operations::By;

use crate::domain::{duty, Duty};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Duty`] by its [`duty::Id`].
pub type ById = DatabaseQuery<By<Option<Duty>, duty::Id>>;
