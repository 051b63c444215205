//! Non-blocking existence checks.
//!
//! The stat itself is a blocking call, so both entry points move it off the
//! caller: onto tokio's blocking pool when a runtime is available, onto a
//! dedicated thread otherwise. Each check is independent. There is no
//! ordering between concurrent checks and no way to cancel one.

use std::path::PathBuf;
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, warn};

use crate::traits::BlobPersistence;

/// Check `path` in the background and pass the answer to `callback`.
///
/// `callback` runs exactly once, never inline and never on the calling
/// thread: this function returns before the check is guaranteed to finish.
/// Callers must not assume any particular completion thread.
pub fn dispatch<P, F>(store: &P, path: PathBuf, callback: F)
where
    P: BlobPersistence + Clone + 'static,
    F: FnOnce(bool) + Send + 'static,
{
    let store = store.clone();
    let job = move || callback(store.file_exists(&path));

    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
        }
        Err(_) => {
            if let Err(e) = thread::Builder::new()
                .name("burrow-exists".into())
                .spawn(job)
            {
                error!(error = %e, "failed to start existence-check thread");
            }
        }
    }
}

/// Check `path` in the background and resolve to the answer.
///
/// Uses the same placement as [`dispatch`], with the answer delivered over a
/// oneshot channel, so the future can be awaited on any executor.
pub async fn check<P>(store: P, path: PathBuf) -> bool
where
    P: BlobPersistence + Clone + 'static,
{
    let (tx, rx) = oneshot::channel();
    dispatch(&store, path, move |exists| {
        let _ = tx.send(exists);
    });

    match rx.await {
        Ok(exists) => exists,
        Err(_) => {
            warn!("existence check ended without an answer");
            false
        }
    }
}
