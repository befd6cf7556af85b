use cdpdocs_core::error::{Error, Result};

/// Run synchronous index, store or embedding work on tokio's blocking pool.
/// A panicked or cancelled task surfaces as `Upstream`.
pub(crate) async fn run_blocking<F, T>(context: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| Error::upstream(context, e))?
}

/// Embedder failures are reported as `Upstream`; configuration errors keep their kind.
pub(crate) fn embedder_error(context: &str, err: Error) -> Error {
    match err {
        Error::Upstream(_) => err,
        e if e.is_config() => e,
        e => Error::upstream(context, e),
    }
}
