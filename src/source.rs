//! The arrival generator.

use tracing::trace;

use crate::event::{Event, EventKind, NodeId};
use crate::job::{Job, JobId};
use crate::sampler::Sampler;
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// Issues the stream of jobs at the head of the line.
///
/// The source drives itself with a `GenerateJob` trigger: each firing mints
/// one job, forwards it to the first station as an immediate arrival, and
/// schedules a fresh trigger one interarrival gap away while jobs remain.
/// After the last job the trigger is simply not rescheduled and the line
/// drains naturally.
pub struct Source {
    total: u64,
    issued: u64,
    interarrival: Box<dyn Sampler>,
    out: NodeId,
}

impl Source {
    pub(crate) fn new(total: u64, interarrival: Box<dyn Sampler>) -> Self {
        Self {
            total,
            issued: 0,
            interarrival,
            out: NodeId::Station(0),
        }
    }

    /// Schedules the first trigger at time zero.
    pub(crate) fn start(&self, scheduler: &mut Scheduler) {
        scheduler.add(Event::new(
            NodeId::Source,
            NodeId::Source,
            SimTime::EPOCH,
            EventKind::GenerateJob,
        ));
    }

    /// Handles the trigger: one fresh job out, one fresh trigger in.
    pub(crate) fn receive(&mut self, event: &Event, scheduler: &mut Scheduler) {
        debug_assert_eq!(event.kind, EventKind::GenerateJob, "unexpected {event}");
        let now = scheduler.now();

        self.issued += 1;
        let job = Job::new(JobId(self.issued), now);
        trace!(job = ?job.id(), %now, "job issued");
        scheduler.add(Event::with_job(
            NodeId::Source,
            self.out,
            now,
            EventKind::Arrive,
            job,
        ));

        if self.issued < self.total {
            let next = now + self.interarrival.sample();
            scheduler.add(Event::new(
                NodeId::Source,
                NodeId::Source,
                next,
                EventKind::GenerateJob,
            ));
        }
    }

    /// Total number of jobs this source will issue.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of jobs issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}
