/// Result of advancing a countdown by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; carries the ticks left
    Running(u32),
    /// Reached zero on this tick. Reported exactly once.
    Expired,
    /// Already expired or cancelled; the tick was ignored
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Running,
    Expired,
    Cancelled,
}

/// Tick-driven countdown used for per-round timers.
///
/// The owner feeds it ticks; once it expires or is cancelled every further
/// tick is `Inactive`, so an expiry can never be observed twice.
#[derive(Debug, Clone)]
pub struct Countdown {
    total: u32,
    remaining: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn start(total: u32) -> Self {
        Self {
            total,
            remaining: total,
            state: CountdownState::Running,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != CountdownState::Running {
            return Tick::Inactive;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = CountdownState::Expired;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// Stops the countdown. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Cancelled;
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_active(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_once() {
        let mut countdown = Countdown::start(3);
        assert_eq!(countdown.tick(), Tick::Running(2));
        assert_eq!(countdown.tick(), Tick::Running(1));
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Inactive);
        assert!(countdown.is_expired());
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn cancel_is_idempotent_and_silences_ticks() {
        let mut countdown = Countdown::start(10);
        countdown.tick();
        countdown.cancel();
        countdown.cancel();

        assert!(!countdown.is_active());
        assert!(!countdown.is_expired());
        assert_eq!(countdown.tick(), Tick::Inactive);
        assert_eq!(countdown.remaining(), 9);
    }

    #[test]
    fn cancel_after_expiry_keeps_expired_state() {
        let mut countdown = Countdown::start(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        countdown.cancel();
        assert!(countdown.is_expired());
    }

    #[test]
    fn zero_length_countdown_expires_on_first_tick() {
        let mut countdown = Countdown::start(0);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.total(), 0);
    }
}
