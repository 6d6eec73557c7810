//! A small extension trait for working with futures.

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// Adds [`FutureExt::with_timeout`] to every future.
pub trait FutureExt: Future + Sized {
    /// Bounds this future to `duration`, matching the ack-timeout and
    /// handshake-timeout needs of the RTMP session state machine.
    fn with_timeout(self, duration: Duration) -> impl Future<Output = Result<Self::Output, Elapsed>> {
        tokio::time::timeout(duration, self)
    }
}

impl<F: Future> FutureExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn ready_future_completes_before_timeout() {
        let result = async { 42 }.with_timeout(Duration::from_millis(50)).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn pending_future_times_out() {
        let result = std::future::pending::<()>()
            .with_timeout(Duration::from_millis(10))
            .await;
        assert!(result.is_err());
    }
}
