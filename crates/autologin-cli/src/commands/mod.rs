pub mod config;
pub mod package;
pub mod run;

use crate::RunError;
use std::future::Future;
use std::time::Duration;

/// Drive `future` on a fresh runtime, racing it against Ctrl-C.
///
/// On Ctrl-C the future is dropped, releasing everything it owns, and
/// [`RunError::Interrupted`] is returned. Prompt threads still blocked on
/// stdin are abandoned by the bounded runtime shutdown.
pub fn run_interruptible<F, T>(future: F) -> Result<T, RunError>
where
    F: Future<Output = Result<T, RunError>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| RunError::Internal(format!("Failed to start async runtime: {}", e)))?;

    let result = runtime.block_on(async {
        tokio::select! {
            result = future => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down...");
                Err(RunError::Interrupted)
            }
        }
    });

    // Explicitly shutdown runtime with timeout to prevent hanging on blocking prompts
    runtime.shutdown_timeout(Duration::from_millis(100));

    result
}

/// Run terminal prompts on the blocking pool so Ctrl-C is still observed
pub async fn prompt_blocking<F, T, E>(work: F) -> Result<T, RunError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<RunError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RunError::Internal(format!("Prompt task failed: {}", e)))?
        .map_err(Into::into)
}
