use time::OffsetDateTime;

/// Time source for expiry decisions, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
pub(crate) mod manual {
    use std::sync::Mutex;
    use std::time::Duration;

    use time::OffsetDateTime;

    use super::Clock;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<OffsetDateTime>,
    }

    impl ManualClock {
        pub(crate) fn new(start: OffsetDateTime) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.now.lock().expect("clock lock");
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.now.lock().expect("clock lock")
        }
    }
}
