//! Operations executed by [`Handler`]s.

use std::marker::PhantomData;

use crate::Handler;

/// Stores a new `T`.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Overwrites a stored `T`.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Removes a stored `T`.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Reads a `T`.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Locks a `T` until the end of the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Starts a long-running `T`.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Performs a single run of `T`.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Opens a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Transaction opened by a [`Transact`] operation on `T`.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Commits a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Addresses a `W` by a `B` key.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Addressed type.
    _what: PhantomData<W>,

    /// Key to address by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Wraps the provided key.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Unwraps the key.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
