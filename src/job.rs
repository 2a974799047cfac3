//! Jobs and their audit trail.

use serde::{Deserialize, Serialize};

use crate::time::SimTime;

/// Stable identity of a job, assigned by the source in issue order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// Tag of an audit log entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTag {
    /// The job arrived at a station.
    Arrival,
    /// The job entered service.
    ServiceStart,
    /// The job departed the station.
    Departure,
}

/// One entry of a job or station audit log: what happened, when, and how
/// long the local queue was at that moment.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: SimTime,
    pub tag: LogTag,
    pub queue_len: usize,
}

/// A unit of work flowing through the line.
///
/// A job is a passive record: it is created by the source, threaded through
/// each station inside the events that move it, and finally owned by the
/// sink. At any instant exactly one place holds it, which is why interrupting
/// a service recovers the job from the cancelled end-of-service event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    created_at: SimTime,
    arrival_time: SimTime,
    service_time: f64,
    finish_time: Option<SimTime>,
    interrupted: bool,
    log: Vec<LogEntry>,
}

impl Job {
    pub(crate) fn new(id: JobId, created_at: SimTime) -> Self {
        Self {
            id,
            created_at,
            arrival_time: created_at,
            service_time: 0.0,
            finish_time: None,
            interrupted: false,
            log: Vec::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Time at which the source issued this job.
    pub fn created_at(&self) -> SimTime {
        self.created_at
    }

    /// Arrival time at the station currently holding the job. Re-stamped on
    /// every arrival.
    pub fn arrival_time(&self) -> SimTime {
        self.arrival_time
    }

    /// Service requirement sampled on arrival at the current station.
    pub fn service_time(&self) -> f64 {
        self.service_time
    }

    /// Completion time, once the sink has collected the job.
    pub fn finish_time(&self) -> Option<SimTime> {
        self.finish_time
    }

    /// Whether a failure or maintenance ever interrupted this job's service.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// The append-only audit log, in event order.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// End-to-end sojourn, available once the job reached the sink.
    pub fn sojourn(&self) -> Option<f64> {
        self.finish_time.map(|finish| finish - self.created_at)
    }

    pub(crate) fn set_arrival(&mut self, now: SimTime) {
        self.arrival_time = now;
    }

    pub(crate) fn set_service_time(&mut self, service_time: f64) {
        self.service_time = service_time;
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub(crate) fn finish(&mut self, now: SimTime) {
        self.finish_time = Some(now);
    }

    pub(crate) fn record(&mut self, tag: LogTag, time: SimTime, queue_len: usize) {
        self.log.push(LogEntry {
            time,
            tag,
            queue_len,
        });
    }
}
