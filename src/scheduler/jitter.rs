//! Deterministic per-entry check times
//!
//! Every entry gets a fixed offset inside the check distribution window,
//! derived from a hash of its key. Checks for many entries therefore spread
//! across the window instead of all firing on the same tick, and separate
//! processes agree on the offsets without talking to each other.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    window: Duration,
    tick: Duration,
}

impl Schedule {
    /// `window` is the check distribution (how often each entry is
    /// checked), `tick` the interval the scheduler wakes up at.
    /// Windows below one second are raised to one second.
    pub fn new(window: Duration, tick: Duration) -> Self {
        Self {
            window: window.max(Duration::from_secs(1)),
            tick,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    fn window_secs(&self) -> i64 {
        i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX)
    }

    /// Offset of `key` inside the window, a pure function of both
    pub fn jitter_offset(&self, key: &str) -> Duration {
        let digest = Sha256::digest(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let hash = u64::from_be_bytes(prefix);

        Duration::from_secs(hash % self.window.as_secs())
    }

    /// Next time `key` should be checked, given when it was last checked
    ///
    /// Entries never checked before are due at `now`. Otherwise the check
    /// lands on the jitter offset inside the window containing the last
    /// check, or inside the following window when that point is less than
    /// one tick after the last check.
    pub fn next_check(
        &self,
        key: &str,
        last_checked: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let Some(last) = last_checked else {
            return now;
        };

        let window = self.window_secs();
        let window_start = last.timestamp().div_euclid(window) * window;
        let offset = i64::try_from(self.jitter_offset(key).as_secs()).unwrap_or(0);

        let Some(mut next) = DateTime::from_timestamp(window_start.saturating_add(offset), 0) else {
            return now;
        };

        let earliest = last + TimeDelta::from_std(self.tick).unwrap_or(TimeDelta::zero());
        if next < earliest {
            next += TimeDelta::seconds(window);
        }

        next
    }

    pub fn is_due(&self, key: &str, last_checked: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        self.next_check(key, last_checked, now) <= now
    }
}
