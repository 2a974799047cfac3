//! Events and node handles.

use std::fmt;

use crate::job::Job;
use crate::time::SimTime;

/// Handle to a node of the flow line.
///
/// Nodes reference their neighbours in both directions and the scheduler
/// targets nodes from events, so all wiring goes through these copyable
/// handles rather than through owning references.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// The arrival generator at the head of the line.
    Source,
    /// The station at the given position, counted from the source.
    Station(usize),
    /// The terminal collector.
    Sink,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Source => write!(f, "source"),
            NodeId::Station(idx) => write!(f, "station-{idx}"),
            NodeId::Sink => write!(f, "sink"),
        }
    }
}

/// The closed set of event kinds exchanged over the scheduler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A job enters a station or the sink.
    Arrive,
    /// The job in service at a station completes.
    EndService,
    /// A station breaks down.
    Fail,
    /// A failed station comes back up.
    Repair,
    /// A station is due for preventive maintenance.
    TriggerMaintenance,
    /// A station finishes its maintenance.
    MaintenanceComplete,
    /// The source is due to issue its next job.
    GenerateJob,
}

/// A pending occurrence at a point in simulation time.
///
/// Events are immutable once inserted into the scheduler. Recurring
/// occurrences, such as the source trigger, are expressed by inserting a
/// fresh event each cycle rather than by reusing one mutable record.
#[derive(Debug)]
pub struct Event {
    /// Originating node.
    pub from: NodeId,
    /// Target node whose handler runs when the event is dispatched.
    pub to: NodeId,
    /// Dispatch time.
    pub time: SimTime,
    pub kind: EventKind,
    /// The job carried by `Arrive` and `EndService` events.
    pub job: Option<Job>,
}

impl Event {
    /// Creates an event carrying no job.
    pub fn new(from: NodeId, to: NodeId, time: SimTime, kind: EventKind) -> Self {
        Self {
            from,
            to,
            time,
            kind,
            job: None,
        }
    }

    /// Creates an event carrying a job.
    pub fn with_job(from: NodeId, to: NodeId, time: SimTime, kind: EventKind, job: Job) -> Self {
        Self {
            from,
            to,
            time,
            kind,
            job: Some(job),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} -> {} @ {}",
            self.kind, self.from, self.to, self.time
        )
    }
}
