//! Reporting [`Query`]s.

pub mod summary;

#[cfg(doc)]
use crate::Query;

pub use self::summary::Summary;
