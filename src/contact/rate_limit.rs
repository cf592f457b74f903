//! Fixed-window request counter keyed by client address

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    /// `None` when the window reaches past what `Instant` can represent
    reset_at: Option<Instant>,
}

impl Window {
    fn is_open(&self, now: Instant) -> bool {
        self.reset_at.map_or(true, |reset_at| now <= reset_at)
    }
}

/// Allows `max_requests` hits per key within each `window`.
///
/// Expired windows are evicted on every check, so the map only holds
/// clients seen during the last window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    entries: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit from `key` and report whether it is over the limit
    pub fn check(&self, key: IpAddr) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading
    pub fn check_at(&self, key: IpAddr, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, w| w.is_open(now));

        match entries.get_mut(&key) {
            Some(window) => {
                window.count = window.count.saturating_add(1);
                window.count > self.max_requests
            }
            None => {
                entries.insert(
                    key,
                    Window {
                        count: 1,
                        reset_at: now.checked_add(self.window),
                    },
                );
                false
            }
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }
}
