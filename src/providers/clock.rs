use std::time::{Duration, SystemTime};

/// Time source for retry scheduling, replaceable in tests.
pub trait Clock {
    fn now(&self) -> SystemTime;

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
