// Shared utility helpers for timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub fn now_epoch_secs() -> u64 {
    now_epoch_ms() / 1000
}

pub fn uptime_secs(start: Instant) -> u64 {
    start.elapsed().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_seconds_track_millis() {
        let ms = now_epoch_ms();
        let secs = now_epoch_secs();
        assert!(secs >= ms / 1000);
        assert!(secs <= ms / 1000 + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn uptime_follows_the_clock() {
        let start = Instant::now();
        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        assert_eq!(uptime_secs(start), 3);
    }
}
