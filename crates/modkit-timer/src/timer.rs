use std::fmt;
use std::time::Duration;

use tracing::trace;

/// Unique identifier for a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Callback run when a timer fires. Receives the context passed to [`Timers::tick`].
pub type TimerCallback<C> = Box<dyn FnMut(&mut C) + Send>;

/// Type of timer
#[derive(Debug, Clone, Copy)]
enum TimerType {
    /// One-shot timer that fires once and is removed
    OneShot { fire_at: Duration },
    /// Recurring timer that fires repeatedly at an interval
    Recurring {
        interval: Duration,
        next_fire: Duration,
    },
}

/// A timer with metadata
struct Timer<C> {
    id: TimerId,
    name: String,
    timer_type: TimerType,
    callback: TimerCallback<C>,
}

/// Capability to run a callback on the next host tick.
///
/// This is the only thing other modkit crates need from the timer system, so
/// they depend on this trait rather than on [`Timers`] directly.
pub trait Scheduler<C> {
    /// Register a callback to run on the next tick
    fn on_next_tick(&mut self, name: &str, callback: TimerCallback<C>) -> TimerId;

    /// Unregister a callback that has not fired yet
    fn cancel(&mut self, id: TimerId) -> bool;
}

/// Manages timers on the host's tick clock
///
/// Time only advances through [`Timers::tick`], so a timer never fires
/// synchronously from the call that scheduled it, even with a zero delay.
pub struct Timers<C> {
    timers: Vec<Timer<C>>,
    next_id: u64,
    /// Total time accumulated from ticks
    elapsed: Duration,
}

impl<C> Timers<C> {
    /// Create a new, empty timer list
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn next_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Schedule a one-shot timer that fires after a delay
    pub fn schedule(
        &mut self,
        delay: Duration,
        name: impl Into<String>,
        callback: TimerCallback<C>,
    ) -> TimerId {
        let id = self.next_id();
        self.timers.push(Timer {
            id,
            name: name.into(),
            timer_type: TimerType::OneShot {
                fire_at: self.elapsed + delay,
            },
            callback,
        });
        id
    }

    /// Schedule a recurring timer that fires repeatedly at an interval
    pub fn schedule_recurring(
        &mut self,
        interval: Duration,
        name: impl Into<String>,
        callback: TimerCallback<C>,
    ) -> TimerId {
        let id = self.next_id();
        self.timers.push(Timer {
            id,
            name: name.into(),
            timer_type: TimerType::Recurring {
                interval,
                next_fire: self.elapsed + interval,
            },
            callback,
        });
        id
    }

    /// Cancel a timer
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    /// Advance the clock by `delta` and run every timer that came due.
    ///
    /// Returns the number of callbacks that fired.
    pub fn tick(&mut self, delta: Duration, ctx: &mut C) -> usize {
        self.elapsed += delta;
        let now = self.elapsed;
        let mut fired = 0;
        let mut finished = Vec::new();

        for timer in self.timers.iter_mut() {
            match &mut timer.timer_type {
                TimerType::OneShot { fire_at } => {
                    if now >= *fire_at {
                        trace!(target: "modkit::timer", "Firing timer {}", timer.name);
                        (timer.callback)(ctx);
                        finished.push(timer.id);
                        fired += 1;
                    }
                }
                TimerType::Recurring {
                    interval,
                    next_fire,
                } => {
                    if now >= *next_fire {
                        trace!(target: "modkit::timer", "Firing recurring timer {}", timer.name);
                        (timer.callback)(ctx);
                        *next_fire = now + *interval;
                        fired += 1;
                    }
                }
            }
        }

        // Remove one-shot timers that have fired
        if !finished.is_empty() {
            self.timers.retain(|timer| !finished.contains(&timer.id));
        }

        fired
    }

    /// Get the number of active timers
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Total time that has passed through [`Timers::tick`]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl<C> Default for Timers<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> for Timers<C> {
    fn on_next_tick(&mut self, name: &str, callback: TimerCallback<C>) -> TimerId {
        self.schedule(Duration::ZERO, name, callback)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.cancel_timer(id)
    }
}

impl<C> fmt::Debug for Timers<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timers")
            .field("active", &self.timers.len())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(50);

    fn push(label: &'static str) -> TimerCallback<Vec<&'static str>> {
        Box::new(move |log: &mut Vec<&'static str>| log.push(label))
    }

    #[test]
    fn test_one_shot_timer() {
        let mut timers = Timers::new();
        let mut log = Vec::new();
        timers.schedule(Duration::from_millis(120), "test", push("test"));

        // Should not fire before the delay has passed
        assert_eq!(timers.tick(STEP, &mut log), 0);
        assert_eq!(timers.tick(STEP, &mut log), 0);
        assert!(log.is_empty());

        assert_eq!(timers.tick(STEP, &mut log), 1);
        assert_eq!(log, vec!["test"]);

        // Should be removed after firing
        assert_eq!(timers.active_count(), 0);
        assert_eq!(timers.tick(STEP, &mut log), 0);
    }

    #[test]
    fn test_recurring_timer() {
        let mut timers = Timers::new();
        let mut log = Vec::new();
        timers.schedule_recurring(Duration::from_millis(100), "recurring", push("r"));

        assert_eq!(timers.tick(STEP, &mut log), 0);
        assert_eq!(timers.tick(STEP, &mut log), 1);

        // Should still be active
        assert_eq!(timers.active_count(), 1);

        assert_eq!(timers.tick(STEP, &mut log), 0);
        assert_eq!(timers.tick(STEP, &mut log), 1);
        assert_eq!(log, vec!["r", "r"]);
    }

    #[test]
    fn test_cancel_timer() {
        let mut timers: Timers<Vec<&'static str>> = Timers::new();
        let id = timers.schedule(Duration::from_secs(10), "test", push("test"));

        assert!(timers.cancel_timer(id));
        assert_eq!(timers.active_count(), 0);
        assert!(!timers.cancel_timer(id)); // Already removed
    }

    #[test]
    fn test_next_tick_is_deferred() {
        let mut timers = Timers::new();
        let mut log = Vec::new();
        timers.on_next_tick("deferred", push("deferred"));

        // Nothing runs until the host ticks
        assert!(log.is_empty());
        assert_eq!(timers.tick(Duration::ZERO, &mut log), 1);
        assert_eq!(log, vec!["deferred"]);
        assert_eq!(timers.active_count(), 0);
    }

    #[test]
    fn test_cancel_through_scheduler() {
        let mut timers = Timers::new();
        let mut log = Vec::new();
        let id = Scheduler::on_next_tick(&mut timers, "never", push("never"));

        assert!(Scheduler::cancel(&mut timers, id));
        timers.tick(STEP, &mut log);
        assert!(log.is_empty());
    }

    #[test]
    fn test_fires_in_schedule_order() {
        let mut timers = Timers::new();
        let mut log = Vec::new();
        timers.schedule(Duration::from_millis(30), "b", push("b"));
        timers.schedule(Duration::from_millis(10), "a", push("a"));
        timers.schedule(Duration::from_millis(90), "c", push("c"));

        timers.tick(STEP, &mut log);
        assert_eq!(log, vec!["b", "a"]);
        assert_eq!(timers.elapsed(), STEP);
    }
}
