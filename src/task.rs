use crate::{Error, Result};
use futures::future::BoxFuture;
use std::future::Future;
use tokio::sync::oneshot;

/// Settles the future returned by [`deferred`]. Consumed on first use, so an
/// outcome can never be overwritten once delivered.
pub struct Slot<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Slot<T> {
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, error: Error) {
        let _ = self.tx.send(Err(error));
    }
}

/// Runs `body` to completion and resolves with whatever it settled into its
/// [`Slot`].
///
/// A failure of the body itself is forwarded to the caller, unless the slot
/// was already settled, in which case the settled outcome wins. A body that
/// finishes cleanly without settling its slot is reported as an error rather
/// than leaving the caller pending forever.
pub async fn deferred<T, F, Fut>(body: F) -> Result<T>
where
    F: FnOnce(Slot<T>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let (tx, mut rx) = oneshot::channel();
    let outcome = body(Slot { tx }).await;
    match rx.try_recv() {
        Ok(settled) => settled,
        Err(_) => {
            outcome?;
            Err(Error::msg("Deferred body completed without settling its slot"))
        }
    }
}

/// A unit of work for [`pipe`]: a closure producing a future, invoked only
/// when its turn comes.
pub type PipeTask<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T>> + Send>;

/// Boxes an async closure as a [`PipeTask`].
pub fn task<T, F, Fut>(f: F) -> PipeTask<T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

/// Runs the tasks strictly one after another, each starting only once the
/// previous one resolved. The first rejection is returned immediately and the
/// remaining tasks are never invoked. Resolves with the last task's value,
/// `None` when `tasks` is empty.
pub async fn pipe<T>(tasks: impl IntoIterator<Item = PipeTask<T>>) -> Result<Option<T>> {
    let mut last = None;
    for task in tasks {
        last = Some(task().await?);
    }
    Ok(last)
}
