//! [`Handler`] abstraction shared by commands, queries and storage.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// Commands, queries, background tasks and storage backends are all
/// [`Handler`]s of their respective operations.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
