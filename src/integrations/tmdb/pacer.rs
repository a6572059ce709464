// src/integrations/tmdb/pacer.rs
//
// Minimum inter-request interval
//
// The reference catalog enforces rate limits; every outbound call waits
// until at least `min_interval` has passed since the previous one. This is
// a policy object rather than a sleep at each call site so the interval is
// injectable and a zero interval turns it off in tests.

use std::time::{Duration, Instant};

pub struct RequestPacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Block until the interval since the previous request has elapsed,
    /// then mark now as the latest request time.
    pub fn pause(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }
}
