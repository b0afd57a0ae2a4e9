//! Environment running spawned [`Task`]s in the background.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Boxed error of a failed [`Task`].
type TaskError = Box<dyn Error + 'static>;

/// Environment running spawned [`Task`]s on the current thread.
///
/// Resolves once all the spawned [`Task`]s finish, or any of them fails.
#[derive(Debug, Default)]
pub struct Background {
    /// [`task::LocalSet`] driving the spawned [`Task`]s.
    tasks: task::LocalSet,

    /// Handles of the spawned [`Task`]s.
    running: Vec<task::JoinHandle<Result<(), TaskError>>>,
}

impl Background {
    /// Spawns the provided [`Task`] future onto this [`Background`].
    pub fn spawn<F, E>(&mut self, task: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self
            .tasks
            .spawn_local(task.map_err(|e| TaskError::from(Box::new(e))));
        self.running.push(handle);
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { tasks, running } = self;
        let running = running.into_iter().map(|handle| {
            handle
                .map(|joined| match joined {
                    Ok(res) => res,
                    Err(e) => Err(TaskError::from(Box::new(e))),
                })
                .boxed_local()
        });
        let tasks = iter::once(tasks.map(Ok).boxed_local());
        future::try_join_all(tasks.chain(running))
            .map_ok(drop)
            .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::{fmt, time::Duration};

    use tokio::time;

    use super::Background;

    #[derive(Debug)]
    struct Failure;

    impl fmt::Display for Failure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "failure")
        }
    }

    impl std::error::Error for Failure {}

    #[tokio::test]
    async fn resolves_with_first_failure() {
        let mut bg = Background::default();
        bg.spawn(async {
            time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, Failure>(())
        });
        bg.spawn(async { Err(Failure) });

        let err = bg.await.unwrap_err();

        assert_eq!(err.to_string(), "failure");
    }

    #[tokio::test]
    async fn resolves_once_all_finish() {
        let mut bg = Background::default();
        bg.spawn(async { Ok::<_, Failure>(()) });
        bg.spawn(async { Ok::<_, Failure>(()) });

        bg.await.unwrap();
    }
}
