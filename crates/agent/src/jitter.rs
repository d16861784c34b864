//! Cancellable random sleep

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Sleep for a random duration in `[0, max)`, returning early when the
/// shutdown token fires. A zero `max` returns immediately.
pub(crate) async fn random_sleep(max: Duration, shutdown: &CancellationToken) {
    if max.is_zero() {
        return;
    }
    let nanos = rand::thread_rng().gen_range(0..max.as_nanos()) as u64;
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_nanos(nanos)) => {}
        _ = shutdown.cancelled() => {}
    }
}
