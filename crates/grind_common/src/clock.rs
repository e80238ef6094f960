//! Time source for expiry checks.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-util"))]
mod manual {
    use super::Clock;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now += by;
        }

        pub fn set(&self, instant: DateTime<Utc>) {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}
