//! The chronological event queue and the simulation clock.

use tracing::trace;

use crate::event::{Event, EventKind, NodeId};
use crate::job::{Job, JobId};
use crate::time::SimTime;
use crate::util::priority_queue::PriorityQueue;

/// Time-ordered set of pending events, owner of the monotonic clock.
///
/// Events with equal timestamps are dispatched in insertion order; with the
/// random streams seeded, this makes every run reproducible. The clock only
/// advances inside [`pop`](Scheduler::pop), so every handler observes the
/// timestamp of the event it is processing.
///
/// Two operations deliberately do nothing rather than fail: cancelling an
/// event that is not pending, and adding an event once the end of the
/// simulation has been reached. The latter is what lets the sink shut the
/// run down by completing the scheduler, without chasing down every station
/// that might still want to re-arm a failure or maintenance cycle.
pub struct Scheduler {
    queue: PriorityQueue<SimTime, Event>,
    clock: SimTime,
    end_of_simulation: SimTime,
    completed: bool,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            clock: SimTime::EPOCH,
            end_of_simulation: SimTime::INFINITY,
            completed: false,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.clock
    }

    /// Whether the sink has declared the run complete.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Number of pending events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Timestamp of the next pending event, if any.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.queue.peek_key().copied()
    }

    /// Number of pending events targeting `to` with the given kind.
    pub fn pending_for(&self, to: NodeId, kind: EventKind) -> usize {
        self.queue
            .values()
            .filter(|event| event.to == to && event.kind == kind)
            .count()
    }

    /// Inserts a pending event.
    ///
    /// Dropped silently once the clock has reached the end of the
    /// simulation.
    pub(crate) fn add(&mut self, event: Event) {
        if self.clock >= self.end_of_simulation {
            trace!(%event, "dropping event scheduled after end of simulation");
            return;
        }
        debug_assert!(event.time >= self.clock, "event scheduled in the past");
        self.queue.insert(event.time, event);
    }

    /// Removes and returns the earliest pending event, advancing the clock
    /// to its timestamp.
    pub(crate) fn pop(&mut self) -> Option<Event> {
        let (time, event) = self.queue.pull()?;
        debug_assert!(time >= self.clock, "clock would move backwards");
        self.clock = time;

        Some(event)
    }

    /// Removes the first pending event targeting `to` with the given kind.
    /// Silent no-op when nothing matches.
    pub(crate) fn cancel_event(&mut self, to: NodeId, kind: EventKind) -> Option<Event> {
        self.queue
            .remove_first(|event| event.to == to && event.kind == kind)
    }

    /// Removes the first pending event targeting `to` that carries the given
    /// job. Silent no-op when nothing matches.
    pub(crate) fn cancel_job(&mut self, to: NodeId, job: JobId) -> Option<Event> {
        self.queue
            .remove_first(|event| event.to == to && event.job.as_ref().map(Job::id) == Some(job))
    }

    /// Declares the run complete: pins the end of the simulation to the
    /// current clock, so later insertions drop, and discards all pending
    /// events.
    pub(crate) fn complete(&mut self) {
        self.completed = true;
        self.end_of_simulation = self.clock;
        self.clear();
    }

    /// Discards all pending events.
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
