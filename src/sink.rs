//! The terminal collector.

use std::collections::BTreeMap;

use tracing::debug;

use crate::event::{Event, EventKind};
use crate::job::{Job, LogTag};
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// Collects finished jobs at the tail of the line.
///
/// The sink stamps each job's finish time and records its end-to-end
/// sojourn. When the last expected job arrives it completes the scheduler,
/// which discards every pending event and shuts the run down.
pub struct Sink {
    expected: u64,
    jobs: Vec<Job>,
    sojourns: Vec<f64>,
}

impl Sink {
    pub(crate) fn new(expected: u64) -> Self {
        Self {
            expected,
            jobs: Vec::new(),
            sojourns: Vec::new(),
        }
    }

    pub(crate) fn receive(&mut self, event: Event, scheduler: &mut Scheduler) {
        debug_assert_eq!(event.kind, EventKind::Arrive, "unexpected {event}");
        let mut job = event.job.expect("arrivals at the sink carry their job");
        let now = scheduler.now();
        job.finish(now);
        self.sojourns.push(now - job.created_at());
        self.jobs.push(job);

        if self.jobs.len() as u64 == self.expected {
            debug!(%now, jobs = self.jobs.len(), "all jobs collected, completing the run");
            scheduler.complete();
        }
    }

    /// Number of jobs collected so far.
    pub fn collected(&self) -> usize {
        self.jobs.len()
    }

    /// The collected jobs, in arrival order at the sink.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Mean end-to-end sojourn across collected jobs.
    pub fn mean_sojourn(&self) -> Option<f64> {
        if self.sojourns.is_empty() {
            return None;
        }
        Some(self.sojourns.iter().sum::<f64>() / self.sojourns.len() as f64)
    }

    /// Finish time of the last collected job.
    pub fn total_elapsed(&self) -> Option<SimTime> {
        self.jobs.last().and_then(Job::finish_time)
    }

    /// Queue lengths seen by the collected jobs on arrival, aggregated over
    /// their whole path.
    pub fn arrival_stats(&self) -> BTreeMap<usize, u64> {
        self.stats(LogTag::Arrival)
    }

    /// Queue lengths left behind by the collected jobs on departure.
    pub fn departure_stats(&self) -> BTreeMap<usize, u64> {
        self.stats(LogTag::Departure)
    }

    /// Time-ordered `(time, queue length)` points at the collected jobs'
    /// arrival instants.
    pub fn queue_at_arrival_times(&self) -> Vec<(SimTime, usize)> {
        let mut points: Vec<_> = self
            .jobs
            .iter()
            .flat_map(Job::log)
            .filter(|entry| entry.tag == LogTag::Arrival)
            .map(|entry| (entry.time, entry.queue_len))
            .collect();
        points.sort_by_key(|(time, _)| *time);
        points
    }

    fn stats(&self, tag: LogTag) -> BTreeMap<usize, u64> {
        let mut histogram = BTreeMap::new();
        for entry in self.jobs.iter().flat_map(Job::log) {
            if entry.tag == tag {
                *histogram.entry(entry.queue_len).or_insert(0) += 1;
            }
        }
        histogram
    }
}
