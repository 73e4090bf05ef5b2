//! Periodic timers driven by an explicit, time-ordered event queue.
//!
//! A [`Scheduler`] holds any number of periodic timers, each with a fixed
//! period and a task payload. [`Scheduler::advance_to`] pops every occurrence
//! due at or before the target time, oldest first, and hands its payload to a
//! caller-supplied closure. Occurrences due at the same instant fire in timer
//! registration order.
//!
//! Occurrence `n` of a timer is due at `anchor + n * period`, computed by
//! multiplication rather than repeated addition, so long runs do not drift.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use boxdrop::schedule::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add_timer("fast", Duration::from_millis(10), 'f');
//! scheduler.add_timer("slow", Duration::from_millis(25), 's');
//!
//! let mut fired = String::new();
//! scheduler.advance_to(Duration::from_millis(50), |task, _due| fired.push(task));
//! assert_eq!(fired, "ffsfffs");
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Handle to a timer registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(usize);

#[derive(Debug)]
struct Timer<T> {
    name: String,
    period: Duration,
    task: T,
    /// Grid origin; moves only when missed occurrences are dropped.
    anchor: Duration,
    /// Index of the pending occurrence on the grid.
    next_index: u64,
    fired: u64,
    dropped: u64,
}

impl<T> Timer<T> {
    fn due_of(&self, index: u64) -> Duration {
        nth_multiple(self.anchor, self.period, index)
    }

    fn next_due(&self) -> Duration {
        self.due_of(self.next_index)
    }
}

/// `anchor + period * n` without overflow for any realistic run length.
fn nth_multiple(anchor: Duration, period: Duration, n: u64) -> Duration {
    let nanos = period.as_nanos() * u128::from(n);
    let secs = (nanos / 1_000_000_000) as u64;
    let sub = (nanos % 1_000_000_000) as u32;
    anchor + Duration::new(secs, sub)
}

/// A set of periodic timers sharing one clock.
///
/// The clock is virtual: it only moves when [`advance_to`](Self::advance_to)
/// is called. The windowed runner feeds it wall-clock time; tests feed it
/// whatever they like.
#[derive(Debug)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    queue: BinaryHeap<Reverse<(Duration, usize)>>,
    now: Duration,
}

impl<T: Copy> Scheduler<T> {
    /// An empty scheduler with its clock at zero.
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            queue: BinaryHeap::new(),
            now: Duration::ZERO,
        }
    }

    /// Register a periodic timer. Its first occurrence is one `period` after
    /// the current clock.
    ///
    /// # Panics
    ///
    /// - If `period` is zero.
    /// - If a timer with the same name is already registered.
    pub fn add_timer(&mut self, name: &str, period: Duration, task: T) -> TimerId {
        assert!(!period.is_zero(), "timer '{name}' must have a non-zero period");
        assert!(
            !self.timers.iter().any(|t| t.name == name),
            "duplicate timer name: {name:?}"
        );

        let idx = self.timers.len();
        let timer = Timer {
            name: name.to_owned(),
            period,
            task,
            anchor: self.now,
            next_index: 1,
            fired: 0,
            dropped: 0,
        };
        self.queue.push(Reverse((timer.next_due(), idx)));
        self.timers.push(timer);
        TimerId(idx)
    }

    /// Fire every occurrence due at or before `until`, in due order.
    ///
    /// `on_fire` receives the task payload and the occurrence's due time.
    /// While it runs, [`now`](Self::now) reads as that due time. Afterwards
    /// the clock rests at `until` (it never moves backwards).
    ///
    /// Returns the number of occurrences fired.
    pub fn advance_to<F>(&mut self, until: Duration, mut on_fire: F) -> u64
    where
        F: FnMut(T, Duration),
    {
        let mut fired = 0u64;
        while let Some(&Reverse((due, idx))) = self.queue.peek() {
            if due > until {
                break;
            }
            self.queue.pop();
            self.now = self.now.max(due);

            let timer = &mut self.timers[idx];
            timer.fired += 1;
            timer.next_index += 1;
            let task = timer.task;
            self.queue.push(Reverse((timer.next_due(), idx)));

            on_fire(task, due);
            fired += 1;
        }
        self.now = self.now.max(until);
        fired
    }

    /// Collapse each timer's overdue occurrences into one.
    ///
    /// For every timer with more than one occurrence due at or before
    /// `now`, all but the latest are discarded; the latest stays pending and
    /// fires on the next [`advance_to`](Self::advance_to). Returns the total
    /// number of occurrences discarded.
    pub fn drop_missed(&mut self, now: Duration) -> u64 {
        let mut dropped = 0u64;
        for timer in &mut self.timers {
            if now < timer.next_due() {
                continue;
            }
            let elapsed = (now - timer.anchor).as_nanos();
            let latest = (elapsed / timer.period.as_nanos()) as u64;
            if latest > timer.next_index {
                let skipped = latest - timer.next_index;
                timer.dropped += skipped;
                timer.next_index = latest;
                dropped += skipped;
            }
        }
        if dropped > 0 {
            self.rebuild_queue();
        }
        dropped
    }

    fn rebuild_queue(&mut self) {
        self.queue = self
            .timers
            .iter()
            .enumerate()
            .map(|(idx, t)| Reverse((t.next_due(), idx)))
            .collect();
    }

    // -- accessors ----------------------------------------------------------

    /// The scheduler clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Due time of the earliest pending occurrence, if any timer exists.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse((due, _))| *due)
    }

    /// How many occurrences of `timer` have fired.
    pub fn fired(&self, timer: TimerId) -> u64 {
        self.timers[timer.0].fired
    }

    /// How many occurrences of `timer` were discarded by
    /// [`drop_missed`](Self::drop_missed).
    pub fn dropped(&self, timer: TimerId) -> u64 {
        self.timers[timer.0].dropped
    }

    /// The period of `timer`.
    pub fn period(&self, timer: TimerId) -> Duration {
        self.timers[timer.0].period
    }

    /// The number of registered timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Timer names in registration order.
    pub fn timer_names(&self) -> Vec<&str> {
        self.timers.iter().map(|t| t.name.as_str()).collect()
    }
}

impl<T: Copy> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn new_scheduler_is_idle() {
        let s: Scheduler<u8> = Scheduler::new();
        assert_eq!(s.now(), Duration::ZERO);
        assert_eq!(s.next_due(), None);
        assert_eq!(s.timer_count(), 0);
    }

    #[test]
    fn first_occurrence_is_one_period_out() {
        let mut s = Scheduler::new();
        s.add_timer("t", ms(100), ());
        assert_eq!(s.next_due(), Some(ms(100)));
    }

    #[test]
    #[should_panic(expected = "non-zero period")]
    fn zero_period_panics() {
        let mut s = Scheduler::new();
        s.add_timer("t", Duration::ZERO, ());
    }

    #[test]
    #[should_panic(expected = "duplicate timer name")]
    fn duplicate_name_panics() {
        let mut s = Scheduler::new();
        s.add_timer("physics", ms(16), ());
        s.add_timer("physics", ms(1000), ());
    }

    #[test]
    fn nothing_fires_before_due() {
        let mut s = Scheduler::new();
        let id = s.add_timer("t", ms(100), ());
        let fired = s.advance_to(ms(99), |_, _| {});
        assert_eq!(fired, 0);
        assert_eq!(s.fired(id), 0);
        assert_eq!(s.now(), ms(99));
    }

    #[test]
    fn due_boundary_is_inclusive() {
        let mut s = Scheduler::new();
        let id = s.add_timer("t", ms(100), ());
        s.advance_to(ms(100), |_, _| {});
        assert_eq!(s.fired(id), 1);
        assert_eq!(s.next_due(), Some(ms(200)));
    }

    #[test]
    fn occurrences_fire_in_time_order() {
        let mut s = Scheduler::new();
        s.add_timer("a", ms(30), 'a');
        s.add_timer("b", ms(20), 'b');

        let mut log = Vec::new();
        s.advance_to(ms(90), |task, due| log.push((task, due)));

        assert_eq!(
            log,
            vec![
                ('b', ms(20)),
                ('a', ms(30)),
                ('b', ms(40)),
                ('a', ms(60)),
                ('b', ms(60)),
                ('b', ms(80)),
                ('a', ms(90)),
            ]
        );
    }

    #[test]
    fn simultaneous_occurrences_fire_in_registration_order() {
        let mut s = Scheduler::new();
        s.add_timer("first", ms(50), 1);
        s.add_timer("second", ms(50), 2);
        let mut log = Vec::new();
        s.advance_to(ms(100), |task, _| log.push(task));
        assert_eq!(log, vec![1, 2, 1, 2]);
    }

    #[test]
    fn sixty_hertz_grid_does_not_drift() {
        let mut s = Scheduler::new();
        let id = s.add_timer("physics", Duration::from_secs(1) / 60, ());
        s.advance_to(Duration::from_secs(60), |_, _| {});
        // 3600 occurrences in 60 s; the 3600th is due a hair before 60 s.
        assert_eq!(s.fired(id), 3600);
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut s = Scheduler::new();
        s.add_timer("t", ms(10), ());
        s.advance_to(ms(50), |_, _| {});
        let fired = s.advance_to(ms(20), |_, _| {});
        assert_eq!(fired, 0);
        assert_eq!(s.now(), ms(50));
    }

    #[test]
    fn timer_added_later_anchors_at_current_clock() {
        let mut s = Scheduler::new();
        s.add_timer("early", ms(100), 'e');
        s.advance_to(ms(30), |_, _| {});
        s.add_timer("late", ms(100), 'l');
        assert_eq!(s.next_due(), Some(ms(100)));

        let mut log = Vec::new();
        s.advance_to(ms(130), |task, due| log.push((task, due)));
        assert_eq!(log, vec![('e', ms(100)), ('l', ms(130))]);
    }

    #[test]
    fn now_reads_due_time_inside_callback() {
        let mut s = Scheduler::new();
        s.add_timer("t", ms(25), ());
        let mut dues = Vec::new();
        s.advance_to(ms(60), |_, due| dues.push(due));
        assert_eq!(dues, vec![ms(25), ms(50)]);
        assert_eq!(s.now(), ms(60));
    }

    #[test]
    fn drop_missed_keeps_only_latest_overdue() {
        let mut s = Scheduler::new();
        let fast = s.add_timer("fast", ms(10), 'f');
        let slow = s.add_timer("slow", ms(1000), 's');

        let dropped = s.drop_missed(ms(95));
        // fast had occurrences at 10..=90 pending; only 90 survives.
        assert_eq!(dropped, 8);
        assert_eq!(s.dropped(fast), 8);
        assert_eq!(s.dropped(slow), 0);

        let mut log = Vec::new();
        s.advance_to(ms(95), |task, due| log.push((task, due)));
        assert_eq!(log, vec![('f', ms(90))]);
        assert_eq!(s.next_due(), Some(ms(100)));
    }

    #[test]
    fn drop_missed_is_noop_when_on_time() {
        let mut s = Scheduler::new();
        let id = s.add_timer("t", ms(10), ());
        s.advance_to(ms(40), |_, _| {});
        assert_eq!(s.drop_missed(ms(45)), 0);
        assert_eq!(s.drop_missed(ms(50)), 0);
        assert_eq!(s.dropped(id), 0);
    }

    #[test]
    fn accessors_report_registration() {
        let mut s = Scheduler::new();
        let a = s.add_timer("physics", ms(16), 0);
        s.add_timer("spawn", ms(1000), 1);
        assert_eq!(s.timer_count(), 2);
        assert_eq!(s.timer_names(), vec!["physics", "spawn"]);
        assert_eq!(s.period(a), ms(16));
    }
}
