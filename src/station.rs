//! The station automaton.
//!
//! A station is a single server in front of a bounded buffer. It alternates
//! between the states below, coordinating job service with interrupting
//! failures, scheduled maintenance and backpressure from its downstream
//! neighbour:
//!
//! | transition     | from        | to          | action                                              |
//! |----------------|-------------|-------------|-----------------------------------------------------|
//! | start service  | Up          | Up          | schedule end of service after the job's requirement |
//! | fail           | Up          | Failed      | preempt the active job, schedule the repair         |
//! | repair         | Failed      | Up          | resume or pull next, re-arm the failure process     |
//! | maintain       | Up          | Maintenance | preempt, cancel the pending failure                 |
//! | interrep       | Failed      | Maintenance | cancel the pending repair                           |
//! | maint complete | Maintenance | Up          | resume or pull next, re-arm failure and maintenance |
//! | block          | Up          | Blocked     | stop starting services; the active one may finish   |
//! | unblock        | Blocked     | Up          | pull the next job if the server is free             |
//!
//! Failures and maintenance strike only stations that are `Up` or `Failed`.
//! A failure or maintenance trigger that lands while the station is
//! `Blocked` is skipped; the corresponding process stays quiet until its
//! next regeneration point, if any.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::buffer::{BackpressureListener, BoundedBuffer, Notification};
use crate::error::SimulationError;
use crate::event::{Event, EventKind, NodeId};
use crate::job::{Job, JobId, LogEntry, LogTag};
use crate::sampler::Sampler;
use crate::scheduler::Scheduler;
use crate::time::SimTime;

/// State of the station automaton.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum StationState {
    Up,
    Failed,
    Maintenance,
    Blocked,
}

/// A single-server station with a bounded buffer.
///
/// The `blocked` flag always mirrors the saturation of the downstream
/// buffer. The `Blocked` state is only entered from `Up`; a station that is
/// `Failed` or under `Maintenance` when its downstream fills keeps its state
/// and only records the flag.
pub struct Station {
    id: usize,
    name: String,
    out: NodeId,

    state: StationState,
    blocked: bool,
    busy: u8,
    buffer: BoundedBuffer,
    active: Option<JobId>,
    preempted: Option<Job>,

    service: Box<dyn Sampler>,
    mtbf: Box<dyn Sampler>,
    mttr: Box<dyn Sampler>,
    maint_interval: Box<dyn Sampler>,
    maint_duration: Box<dyn Sampler>,

    arrived: u64,
    processed: u64,
    failures: u64,
    maintenances: u64,
    cycle_times: Vec<f64>,
    log: Vec<LogEntry>,
    idle_time: f64,
    idle_since: Option<SimTime>,
    blocked_time: f64,
    blocked_since: Option<SimTime>,
}

impl Station {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        out: NodeId,
        capacity: usize,
        service: Box<dyn Sampler>,
        mtbf: Box<dyn Sampler>,
        mttr: Box<dyn Sampler>,
        maint_interval: Box<dyn Sampler>,
        maint_duration: Box<dyn Sampler>,
    ) -> Self {
        Self {
            id,
            name: format!("station-{id}"),
            out,
            state: StationState::Up,
            blocked: false,
            busy: 0,
            buffer: BoundedBuffer::new(capacity),
            active: None,
            preempted: None,
            service,
            mtbf,
            mttr,
            maint_interval,
            maint_duration,
            arrived: 0,
            processed: 0,
            failures: 0,
            maintenances: 0,
            cycle_times: Vec::new(),
            log: Vec::new(),
            idle_time: 0.0,
            // The server is born idle.
            idle_since: Some(SimTime::EPOCH),
            blocked_time: 0.0,
            blocked_since: None,
        }
    }

    fn node(&self) -> NodeId {
        NodeId::Station(self.id)
    }

    /// Handles an incoming job: stamp it, sample its service requirement,
    /// audit, buffer it and try to pull it into service.
    ///
    /// The push notification is returned first so the caller can deliver a
    /// `Block` to the upstream listener before service is attempted.
    pub(crate) fn admit(&mut self, mut job: Job, now: SimTime) -> Option<Notification> {
        self.arrived += 1;
        job.set_arrival(now);
        job.set_service_time(self.service.sample());
        // The job's own audit sees the whole station content, the station
        // log only the queue.
        job.record(LogTag::Arrival, now, self.busy as usize + self.buffer.len());
        self.log.push(LogEntry {
            time: now,
            tag: LogTag::Arrival,
            queue_len: self.buffer.len(),
        });
        trace!(station = %self.name, job = ?job.id(), %now, "arrival");

        self.buffer.push(job)
    }

    /// Pulls the buffer head into service when the station is able to:
    /// buffer non-empty, server free, `Up` and not blocked.
    pub(crate) fn try_start(&mut self, scheduler: &mut Scheduler) -> Option<Notification> {
        if self.busy != 0
            || self.state != StationState::Up
            || self.blocked
            || self.buffer.is_empty()
        {
            return None;
        }

        let now = scheduler.now();
        let (mut job, note) = self
            .buffer
            .pop_front()
            .expect("buffer checked non-empty above");
        self.busy = 1;
        job.record(LogTag::ServiceStart, now, self.buffer.len());
        self.active = Some(job.id());
        let end = now + job.service_time();
        trace!(station = %self.name, job = ?job.id(), %end, "service started");
        scheduler.add(Event::with_job(
            self.node(),
            self.node(),
            end,
            EventKind::EndService,
            job,
        ));
        self.touch(now);

        note
    }

    /// Completes the job in service: audit, forward it downstream as an
    /// arrival at the current time, free the server and pull the next job.
    pub(crate) fn finish(&mut self, mut job: Job, scheduler: &mut Scheduler) -> Option<Notification> {
        debug_assert_eq!(self.active, Some(job.id()), "end of service for a job not in service");
        debug_assert!(
            matches!(self.state, StationState::Up | StationState::Blocked),
            "end of service in state {:?}",
            self.state
        );
        let now = scheduler.now();
        job.record(LogTag::Departure, now, self.buffer.len());
        self.log.push(LogEntry {
            time: now,
            tag: LogTag::Departure,
            queue_len: self.buffer.len(),
        });
        self.processed += 1;
        self.busy = 0;
        self.active = None;
        self.cycle_times.push(now - job.arrival_time());
        trace!(station = %self.name, job = ?job.id(), to = %self.out, "departure");
        // Blocking inhibits starting, not finishing: the departure is
        // forwarded even when the station is currently blocked.
        scheduler.add(Event::with_job(
            self.node(),
            self.out,
            now,
            EventKind::Arrive,
            job,
        ));

        let note = self.try_start(scheduler);
        self.touch(now);

        note
    }

    /// Breakdown. Preempts the job in service, if any, and schedules the
    /// repair.
    pub(crate) fn fail(&mut self, scheduler: &mut Scheduler) {
        let now = scheduler.now();
        match self.state {
            StationState::Up => {
                if self.active.is_some() {
                    self.interrupt(scheduler);
                }
                self.state = StationState::Failed;
                self.failures += 1;
                let repair_at = now + self.mttr.sample();
                debug!(station = %self.name, %now, %repair_at, "failed");
                scheduler.add(Event::new(
                    self.node(),
                    self.node(),
                    repair_at,
                    EventKind::Repair,
                ));
                self.touch(now);
            }
            StationState::Blocked => {
                // Failures strike only stations that are Up or Failed; a
                // blocked server is not running and cannot break. The
                // failure process stays quiet until its next regeneration.
                trace!(station = %self.name, %now, "failure skipped while blocked");
            }
            StationState::Failed | StationState::Maintenance => {
                debug_assert!(false, "pending failure in state {:?}", self.state);
            }
        }
    }

    /// End of repair. Resumes the preempted job or pulls the next one, and
    /// re-arms the failure process.
    pub(crate) fn repair(&mut self, scheduler: &mut Scheduler) -> Option<Notification> {
        debug_assert_eq!(self.state, StationState::Failed, "repair in state {:?}", self.state);
        let now = scheduler.now();
        self.state = StationState::Up;
        debug!(station = %self.name, %now, "repaired");

        let note = if self.preempted.is_some() {
            self.resume(scheduler);
            None
        } else {
            self.try_start(scheduler)
        };
        self.arm_failure(scheduler);
        self.touch(now);

        note
    }

    /// Reaction to the maintenance trigger, per the trigger policy: `Up`
    /// enters maintenance, `Failed` abandons the repair and enters
    /// maintenance, `Blocked` skips this cycle.
    pub(crate) fn trigger_maintenance(
        &mut self,
        scheduler: &mut Scheduler,
    ) -> Result<(), SimulationError> {
        match self.state {
            StationState::Up => {
                self.begin_maintenance(scheduler);
                Ok(())
            }
            StationState::Failed => {
                scheduler.cancel_event(self.node(), EventKind::Repair);
                self.begin_maintenance(scheduler);
                Ok(())
            }
            StationState::Blocked => {
                // Skipped outright: the trigger is only regenerated on
                // maintenance completion, so no new one is scheduled here.
                warn!(station = %self.name, now = %scheduler.now(), "maintenance skipped while blocked");
                Ok(())
            }
            StationState::Maintenance => Err(SimulationError::InvalidTransition {
                station: self.name.clone(),
                state: self.state,
                kind: EventKind::TriggerMaintenance,
                dump: self.state_dump(),
            }),
        }
    }

    /// End of maintenance. Resumes or pulls the next job, then re-arms both
    /// the failure and the maintenance processes.
    pub(crate) fn maintenance_complete(&mut self, scheduler: &mut Scheduler) -> Option<Notification> {
        debug_assert_eq!(
            self.state,
            StationState::Maintenance,
            "maintenance completion in state {:?}",
            self.state
        );
        let now = scheduler.now();
        self.state = StationState::Up;
        debug!(station = %self.name, %now, "maintenance complete");

        let note = if self.preempted.is_some() {
            self.resume(scheduler);
            None
        } else {
            self.try_start(scheduler)
        };
        self.arm_failure(scheduler);
        self.arm_maintenance(scheduler);
        self.touch(now);

        note
    }

    /// Schedules the next breakdown.
    pub(crate) fn arm_failure(&mut self, scheduler: &mut Scheduler) {
        let at = scheduler.now() + self.mtbf.sample();
        scheduler.add(Event::new(self.node(), self.node(), at, EventKind::Fail));
    }

    /// Schedules the next maintenance trigger.
    pub(crate) fn arm_maintenance(&mut self, scheduler: &mut Scheduler) {
        let at = scheduler.now() + self.maint_interval.sample();
        scheduler.add(Event::new(
            self.node(),
            self.node(),
            at,
            EventKind::TriggerMaintenance,
        ));
    }

    /// Common entry into `Maintenance` from `Up` (maintain) or `Failed`
    /// (interrep): preempt the job in service, silence the failure process
    /// and schedule the completion.
    fn begin_maintenance(&mut self, scheduler: &mut Scheduler) {
        let now = scheduler.now();
        if self.active.is_some() {
            self.interrupt(scheduler);
        }
        scheduler.cancel_event(self.node(), EventKind::Fail);
        self.state = StationState::Maintenance;
        self.maintenances += 1;
        let done_at = now + self.maint_duration.sample();
        debug!(station = %self.name, %now, %done_at, "maintenance started");
        scheduler.add(Event::new(
            self.node(),
            self.node(),
            done_at,
            EventKind::MaintenanceComplete,
        ));
        self.touch(now);
    }

    /// Parks the job in service in the preempted slot, recovering it from
    /// its cancelled end-of-service event. The server slot stays claimed by
    /// the preempted job until it finishes.
    fn interrupt(&mut self, scheduler: &mut Scheduler) {
        let id = self.active.take().expect("interrupt with no job in service");
        let event = scheduler
            .cancel_job(self.node(), id)
            .expect("a job in service has a pending end-of-service event");
        let mut job = event.job.expect("end-of-service events carry their job");
        job.mark_interrupted();
        trace!(station = %self.name, job = ?job.id(), "service interrupted");
        self.preempted = Some(job);
    }

    /// Puts the preempted job back in service. Its service requirement was
    /// sampled on arrival and is not consumed by the outage, so the fresh
    /// end of service is a full requirement away.
    fn resume(&mut self, scheduler: &mut Scheduler) {
        let job = self.preempted.take().expect("resume with no preempted job");
        let now = scheduler.now();
        self.active = Some(job.id());
        let end = now + job.service_time();
        trace!(station = %self.name, job = ?job.id(), %end, "service resumed");
        scheduler.add(Event::with_job(
            self.node(),
            self.node(),
            end,
            EventKind::EndService,
            job,
        ));
    }

    /// Re-evaluates the idle and blocked accumulators against the current
    /// state. Call after every change to `busy`, `state` or `blocked`.
    fn touch(&mut self, now: SimTime) {
        let idle = self.busy == 0 && self.state == StationState::Up && !self.blocked;
        match (self.idle_since, idle) {
            (None, true) => self.idle_since = Some(now),
            (Some(since), false) => {
                self.idle_time += now - since;
                self.idle_since = None;
            }
            _ => {}
        }
        match (self.blocked_since, self.blocked) {
            (None, true) => self.blocked_since = Some(now),
            (Some(since), false) => {
                self.blocked_time += now - since;
                self.blocked_since = None;
            }
            _ => {}
        }
    }

    fn state_dump(&self) -> String {
        format!(
            "busy={}, blocked={}, buffer={}/{}, active={:?}, preempted={:?}, arrived={}, processed={}",
            self.busy,
            self.blocked,
            self.buffer.len(),
            self.buffer.capacity(),
            self.active,
            self.preempted.as_ref().map(Job::id),
            self.arrived,
            self.processed,
        )
    }

    // Observability accessors, for reports, drivers and tests.

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Id of the job currently in service.
    pub fn active(&self) -> Option<JobId> {
        self.active
    }

    /// Id of the job parked by an interruption, awaiting resume.
    pub fn preempted(&self) -> Option<JobId> {
        self.preempted.as_ref().map(Job::id)
    }

    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn maintenances(&self) -> u64 {
        self.maintenances
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Highest buffer fill level observed so far.
    pub fn buffer_peak(&self) -> usize {
        self.buffer.peak()
    }

    /// Mean time from arrival at this station to departure.
    pub fn mean_cycle_time(&self) -> Option<f64> {
        if self.cycle_times.is_empty() {
            return None;
        }
        Some(self.cycle_times.iter().sum::<f64>() / self.cycle_times.len() as f64)
    }

    /// Station-level audit log of arrivals and departures.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Total idle time up to `now`, including a still-open idle period.
    pub fn idle_time_until(&self, now: SimTime) -> f64 {
        self.idle_time + self.idle_since.map_or(0.0, |since| now - since)
    }

    /// Total blocked time up to `now`, including a still-open blocked
    /// period.
    pub fn blocked_time_until(&self, now: SimTime) -> f64 {
        self.blocked_time + self.blocked_since.map_or(0.0, |since| now - since)
    }

    /// Histogram of the queue length seen by arriving jobs.
    pub fn arrival_histogram(&self) -> BTreeMap<usize, u64> {
        let mut histogram = BTreeMap::new();
        for entry in &self.log {
            if entry.tag == LogTag::Arrival {
                *histogram.entry(entry.queue_len).or_insert(0) += 1;
            }
        }
        histogram
    }

}

impl BackpressureListener for Station {
    fn on_block(&mut self, now: SimTime) {
        self.blocked = true;
        if self.state == StationState::Up {
            self.state = StationState::Blocked;
        }
        debug!(station = %self.name, %now, state = ?self.state, "blocked by downstream");
        self.touch(now);
    }

    fn on_unblock(&mut self, now: SimTime, scheduler: &mut Scheduler) -> Option<Notification> {
        self.blocked = false;
        debug!(station = %self.name, %now, "unblocked");
        let note = if self.state == StationState::Blocked {
            self.state = StationState::Up;
            self.try_start(scheduler)
        } else {
            None
        };
        self.touch(now);

        note
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("blocked", &self.blocked)
            .field("busy", &self.busy)
            .field("buffer_len", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
