//! Cooperative 1 Hz countdown for AuxClash rooms.
//!
//! A [`Countdown`] is owned by exactly one room task and drives every phase
//! transition: the room arms it with a duration and an *expiry tag*, then
//! awaits [`Countdown::tick`] inside its `select!` loop alongside the
//! command channel. When the countdown reaches zero the tag comes back out
//! and the room's dispatch table decides what happens next, usually arming
//! the next phase.
//!
//! The tag is **taken out of the timer before expiry is reported**, so an
//! expiry fires exactly once and anything the handler arms is a fresh
//! countdown — there is no window in which a cancelled transition can still
//! fire. `stop()` likewise removes the tag without firing it.
//!
//! Time comes from tokio, so tests run against the paused virtual clock:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         event = countdown.tick() => match event {
//!             CountdownEvent::Tick { .. } => { /* value visible in status */ }
//!             CountdownEvent::Expired(tag) => room.on_expiry(tag),
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

const TICK: Duration = Duration::from_secs(1);

/// What a resolved [`Countdown::tick`] call observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownEvent<T> {
    /// One second elapsed; `remaining` is the new value.
    Tick { remaining: u32 },
    /// The countdown hit zero. The tag has been removed from the timer —
    /// this is the only time it will ever be delivered.
    Expired(T),
}

/// A paused countdown: the remaining seconds and the pending expiry tag,
/// captured by [`Countdown::pause`] and replayed by [`Countdown::resume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PausedCountdown<T> {
    pub remaining: u32,
    pub on_zero: T,
}

struct Armed<T> {
    on_zero: T,
    next_tick: Instant,
}

/// A cooperative countdown ticking once per second toward an expiry tag.
///
/// Single-owner and not reentrant: one room, one countdown, one task.
pub struct Countdown<T> {
    remaining: u32,
    armed: Option<Armed<T>>,
}

impl<T> Countdown<T> {
    /// An idle countdown; [`Self::tick`] pends until armed.
    pub fn idle() -> Self {
        Self {
            remaining: 0,
            armed: None,
        }
    }

    /// Arms the countdown: `secs` seconds until `on_zero` is delivered.
    ///
    /// Replaces any pending tag without firing it. The first tick lands
    /// one second from now. Arming with 0 delivers the tag on that first
    /// tick.
    pub fn arm(&mut self, secs: u32, on_zero: T) {
        self.remaining = secs;
        self.armed = Some(Armed {
            on_zero,
            next_tick: Instant::now() + TICK,
        });
        trace!(secs, "countdown armed");
    }

    /// Disarms without firing; returns the pending tag, if any.
    ///
    /// Idempotent — stopping an idle countdown is a no-op.
    pub fn stop(&mut self) -> Option<T> {
        self.armed.take().map(|armed| armed.on_zero)
    }

    /// Clamps the remaining value down to `floor_secs` (never up),
    /// keeping the tick cadence. Used by lock-in shortcuts to collapse a
    /// long window to its final second.
    pub fn fast_forward(&mut self, floor_secs: u32) {
        if self.armed.is_some() && self.remaining > floor_secs {
            trace!(from = self.remaining, to = floor_secs, "countdown fast-forwarded");
            self.remaining = floor_secs;
        }
    }

    /// Captures remaining seconds + pending tag and disarms.
    /// Returns `None` if the countdown was idle.
    pub fn pause(&mut self) -> Option<PausedCountdown<T>> {
        let armed = self.armed.take()?;
        Some(PausedCountdown {
            remaining: self.remaining,
            on_zero: armed.on_zero,
        })
    }

    /// Re-arms from a paused capture; the countdown picks up exactly
    /// where it left off.
    pub fn resume(&mut self, paused: PausedCountdown<T>) {
        self.arm(paused.remaining, paused.on_zero);
    }

    /// Seconds left on the current countdown (0 when idle or expired).
    pub fn remaining(&self) -> u32 {
        if self.armed.is_some() { self.remaining } else { 0 }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Waits for the next 1 Hz tick.
    ///
    /// While idle this pends forever — in a `select!` loop the other
    /// branches keep running. Cancel-safe: dropping the future mid-sleep
    /// loses nothing, the deadline is stored on the timer.
    pub async fn tick(&mut self) -> CountdownEvent<T> {
        let next_tick = match &self.armed {
            Some(armed) => armed.next_tick,
            None => {
                // Never resolves; select! services its other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next_tick).await;

        if self.remaining > 1 {
            self.remaining -= 1;
            if let Some(armed) = &mut self.armed {
                armed.next_tick = next_tick + TICK;
            }
            return CountdownEvent::Tick {
                remaining: self.remaining,
            };
        }

        self.remaining = 0;
        match self.armed.take() {
            Some(armed) => CountdownEvent::Expired(armed.on_zero),
            // Unreachable: armed was checked above and nothing else runs
            // between. Kept as a harmless tick for robustness.
            None => CountdownEvent::Tick { remaining: 0 },
        }
    }
}

impl<T> Default for Countdown<T> {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_countdown_reads_zero() {
        let countdown: Countdown<&str> = Countdown::idle();
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_armed());
    }

    #[test]
    fn test_stop_is_idempotent_and_returns_tag() {
        let mut countdown = Countdown::idle();
        countdown.arm(5, "expiry");
        assert_eq!(countdown.stop(), Some("expiry"));
        assert_eq!(countdown.stop(), None);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn test_rearm_replaces_tag_without_firing() {
        let mut countdown = Countdown::idle();
        countdown.arm(5, "first");
        countdown.arm(3, "second");
        assert_eq!(countdown.remaining(), 3);
        assert_eq!(countdown.stop(), Some("second"));
    }

    #[test]
    fn test_fast_forward_only_shortens() {
        let mut countdown = Countdown::idle();
        countdown.arm(30, "tag");
        countdown.fast_forward(1);
        assert_eq!(countdown.remaining(), 1);
        // Never lengthens.
        countdown.fast_forward(10);
        assert_eq!(countdown.remaining(), 1);
    }

    #[test]
    fn test_fast_forward_on_idle_is_noop() {
        let mut countdown: Countdown<&str> = Countdown::idle();
        countdown.fast_forward(1);
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_armed());
    }

    #[test]
    fn test_pause_captures_remaining_and_tag() {
        let mut countdown = Countdown::idle();
        countdown.arm(12, "goal");
        let paused = countdown.pause().unwrap();
        assert_eq!(paused.remaining, 12);
        assert_eq!(paused.on_zero, "goal");
        assert!(!countdown.is_armed());

        // Pausing an idle countdown yields nothing.
        assert!(countdown.pause().is_none());
    }

    #[test]
    fn test_resume_rearms_from_capture() {
        let mut countdown = Countdown::idle();
        countdown.arm(12, "goal");
        let paused = countdown.pause().unwrap();

        countdown.resume(paused);
        assert!(countdown.is_armed());
        assert_eq!(countdown.remaining(), 12);
    }
}
