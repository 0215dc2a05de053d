use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between requests, shared by every clone.
#[derive(Clone, Debug)]
pub struct Throttle {
    interval: Duration,
    last: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Throttle { interval, last: Arc::new(Mutex::new(None)) }
    }

    pub async fn wait(&self) {
        if self.interval.is_zero() { return; }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let next = prev + self.interval;
            if next > Instant::now() {
                tokio::time::sleep_until(next).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spaces_consecutive_calls() {
        let t = Throttle::new(Duration::from_millis(40));
        let start = Instant::now();
        t.wait().await;
        t.clone().wait().await;
        t.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
