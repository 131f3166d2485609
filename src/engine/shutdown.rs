use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. This works with limited success.
///
/// On Windows detached processes can't detect signals sent to them, so
/// `codetime stop` killing the process remains the fallback path there.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
    };
}
