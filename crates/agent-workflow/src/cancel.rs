//! Cancellation around suspension points

use agent_core::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Await `fut` unless `token` fires first
///
/// The token is checked before polling and again after completion, so a
/// cancelled run never hands a finished node's output back to the caller.
pub async fn guarded<F>(token: &CancellationToken, fut: F) -> Result<F::Output>
where
    F: Future,
{
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let output = tokio::select! {
        biased;
        () = token.cancelled() => return Err(Error::Cancelled),
        output = fut => output,
    };

    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(output)
}
