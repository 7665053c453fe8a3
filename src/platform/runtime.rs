use std::future::Future;

/// Platform-independent helper to spawn an async task that runs in the background.
#[cfg(target_arch = "wasm32")]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Platform-independent helper to spawn an async task that runs in the background.
///
/// Uses the ambient tokio runtime when called from inside one, otherwise a lazily built
/// background runtime that lives for the rest of the process.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use std::sync::LazyLock;
    use tokio::runtime::{Builder, Handle, Runtime};

    static BACKGROUND_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("plausible-tracker")
            .enable_all()
            .build()
            .expect("failed to build background tokio runtime")
    });

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
    } else {
        let _ = BACKGROUND_RUNTIME.spawn(future);
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use futures::channel::oneshot;

    #[tokio::test(flavor = "current_thread")]
    async fn runs_on_the_ambient_runtime() {
        let (tx, rx) = oneshot::channel();
        spawn_detached(async move {
            let _ = tx.send(7);
        });
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[test]
    fn runs_without_an_ambient_runtime() {
        let (tx, rx) = oneshot::channel();
        spawn_detached(async move {
            let _ = tx.send("done");
        });
        assert_eq!(futures::executor::block_on(rx).unwrap(), "done");
    }
}
