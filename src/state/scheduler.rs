//! Single-threaded timer capability used by the round controller.
//!
//! Callbacks are plain [`TimerAction`] values rather than closures so the
//! controller can dispatch them itself and tests can inspect what is pending.

use std::{collections::BTreeMap, fmt, time::Duration};

use indexmap::IndexMap;

use crate::state::sequence::ButtonId;

/// Opaque handle to one pending timer, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Work the round controller asks to run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Grow the sequence by one step and auto-play it.
    AppendAndPlay,
    /// Light a button and play its tone for `duration`.
    Flash {
        /// Button to light.
        button: ButtonId,
        /// How long it stays lit.
        duration: Duration,
    },
    /// Turn a flashed button back off.
    ButtonOff(ButtonId),
    /// Playback finished; hand control to the player.
    BeginPlayerTurn,
    /// The player took too long to answer.
    ResponseTimeout,
    /// Silence the error cue after its fixed duration.
    StopErrorCue,
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Handle the timer was scheduled under.
    pub token: TimerToken,
    /// Deadline it was due at.
    pub deadline: Duration,
    /// Work to run.
    pub action: TimerAction,
}

/// Schedule-once and cancel-by-token capability.
pub trait Scheduler {
    /// Run `action` once after `delay`, returning a handle for cancellation.
    fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerToken;

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&mut self, token: TimerToken) -> bool;
}

/// Virtual-clock timer queue.
///
/// Timers fire in deadline order, and timers sharing a deadline fire in the
/// order they were scheduled. The queue never sleeps: the owner moves time
/// forward with [`TimerQueue::pop_due`] and [`TimerQueue::settle`].
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_token: u64,
    queue: BTreeMap<(Duration, TimerToken), TimerAction>,
    deadlines: IndexMap<TimerToken, Duration>,
}

impl TimerQueue {
    /// Create an empty queue at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of timers still pending.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether `token` is still waiting to fire.
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.deadlines.contains_key(&token)
    }

    /// Remove the earliest timer due at or before `until`, moving the clock to
    /// its deadline so anything it schedules is measured from that instant.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer> {
        let (&(deadline, token), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }

        let action = self.queue.remove(&(deadline, token))?;
        self.deadlines.shift_remove(&token);
        self.now = self.now.max(deadline);
        Some(FiredTimer {
            token,
            deadline,
            action,
        })
    }

    /// Move the clock forward to `until` once every due timer has been popped.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;

        let deadline = self.now + delay;
        self.queue.insert((deadline, token), action);
        self.deadlines.insert(token, deadline);
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        match self.deadlines.shift_remove(&token) {
            Some(deadline) => self.queue.remove(&(deadline, token)).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue, until: Duration) -> Vec<TimerAction> {
        let mut fired = Vec::new();
        while let Some(timer) = queue.pop_due(until) {
            fired.push(timer.action);
        }
        queue.settle(until);
        fired
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(300), TimerAction::ResponseTimeout);
        queue.schedule(Duration::from_millis(100), TimerAction::BeginPlayerTurn);
        queue.schedule(Duration::from_millis(200), TimerAction::AppendAndPlay);

        assert_eq!(
            drain(&mut queue, Duration::from_secs(1)),
            vec![
                TimerAction::BeginPlayerTurn,
                TimerAction::AppendAndPlay,
                TimerAction::ResponseTimeout,
            ]
        );
        assert_eq!(queue.now(), Duration::from_secs(1));
    }

    #[test]
    fn equal_deadlines_fire_in_submission_order() {
        let mut queue = TimerQueue::new();
        let delay = Duration::from_millis(50);
        queue.schedule(delay, TimerAction::StopErrorCue);
        queue.schedule(delay, TimerAction::AppendAndPlay);
        queue.schedule(delay, TimerAction::BeginPlayerTurn);

        assert_eq!(
            drain(&mut queue, delay),
            vec![
                TimerAction::StopErrorCue,
                TimerAction::AppendAndPlay,
                TimerAction::BeginPlayerTurn,
            ]
        );
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new();
        let keep = queue.schedule(Duration::from_millis(10), TimerAction::AppendAndPlay);
        let dropped = queue.schedule(Duration::from_millis(10), TimerAction::ResponseTimeout);

        assert!(queue.cancel(dropped));
        assert!(!queue.cancel(dropped));
        assert!(queue.is_pending(keep));
        assert_eq!(
            drain(&mut queue, Duration::from_millis(10)),
            vec![TimerAction::AppendAndPlay]
        );
        assert!(!queue.cancel(keep));
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn timers_scheduled_while_firing_are_relative_to_their_parent() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(100), TimerAction::AppendAndPlay);

        let fired = queue.pop_due(Duration::from_secs(1)).unwrap();
        assert_eq!(fired.deadline, Duration::from_millis(100));
        assert_eq!(queue.now(), Duration::from_millis(100));

        queue.schedule(Duration::from_millis(100), TimerAction::BeginPlayerTurn);
        assert_eq!(queue.next_deadline(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn nothing_fires_before_its_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(500), TimerAction::ResponseTimeout);
        assert!(queue.pop_due(Duration::from_millis(499)).is_none());
        assert!(queue.pop_due(Duration::from_millis(500)).is_some());
    }
}
