//! Refresh state machine
//!
//! Pure bookkeeping for the countdown: no timers, no I/O. The driver in the
//! parent module turns its answers into spawned fetches and armed timers.

/// Where the scheduler is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started, or started without any coins to track
    Idle,
    /// Waiting for the next automatic refresh
    Counting { remaining: u64 },
    /// A fetch is outstanding
    Fetching,
}

/// What a tick did to the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not counting; the tick was stale
    Ignored,
    /// Countdown moved to this value
    Remaining(u64),
    /// Countdown hit zero and the state is now `Fetching`
    Due,
}

#[derive(Debug, Clone)]
pub struct RefreshState {
    interval: u64,
    phase: Phase,
}

impl RefreshState {
    /// `interval` is in whole seconds; zero is bumped to one
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            phase: Phase::Idle,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> Option<u64> {
        match self.phase {
            Phase::Counting { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.phase == Phase::Fetching
    }

    /// Enter `Fetching`. Returns false if a fetch is already outstanding.
    pub fn begin_fetch(&mut self) -> bool {
        if self.is_fetching() {
            return false;
        }
        self.phase = Phase::Fetching;
        true
    }

    /// Leave `Fetching` and restart the countdown from the full interval,
    /// whatever the fetch produced. Returns the new remaining value.
    pub fn complete_fetch(&mut self) -> u64 {
        self.phase = Phase::Counting {
            remaining: self.interval,
        };
        self.interval
    }

    /// One second elapsed
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            Phase::Counting { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = Phase::Fetching;
                    TickOutcome::Due
                } else {
                    self.phase = Phase::Counting { remaining };
                    TickOutcome::Remaining(remaining)
                }
            }
            Phase::Idle | Phase::Fetching => TickOutcome::Ignored,
        }
    }

    /// A user asked for prices now. Only honoured while counting.
    pub fn request_manual(&mut self) -> bool {
        match self.phase {
            Phase::Counting { .. } => {
                self.phase = Phase::Fetching;
                true
            }
            Phase::Idle | Phase::Fetching => false,
        }
    }
}
