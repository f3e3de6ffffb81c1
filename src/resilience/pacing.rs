//! Explicit pacing for bursts of record creates.
//!
//! Independent of the rate limiter: even when the write budget has room, a
//! long run of consecutive creates inside one resource is broken up with a
//! fixed pause after every batch.

use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RecordPacer {
    batch_size: usize,
    delay: Duration,
    since_pause: usize,
    pauses: u32,
}

impl RecordPacer {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
            since_pause: 0,
            pauses: 0,
        }
    }

    /// Call before each create; sleeps once a full batch has gone out
    pub async fn before_call(&mut self) {
        if self.since_pause >= self.batch_size {
            debug!(
                batch_size = self.batch_size,
                delay_ms = self.delay.as_millis() as u64,
                "Pacing pause between record batches"
            );
            tokio::time::sleep(self.delay).await;
            self.since_pause = 0;
            self.pauses += 1;
        }
        self.since_pause += 1;
    }

    /// Number of pauses taken so far
    pub fn pauses(&self) -> u32 {
        self.pauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pauses_after_every_full_batch() {
        let mut pacer = RecordPacer::new(5, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..12 {
            pacer.before_call().await;
        }

        // calls 6 and 11 each wait for the previous batch
        assert_eq!(pacer.pauses(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_trailing_pause_for_exact_batch() {
        let mut pacer = RecordPacer::new(5, Duration::from_secs(1));
        for _ in 0..5 {
            pacer.before_call().await;
        }
        assert_eq!(pacer.pauses(), 0);
    }
}
