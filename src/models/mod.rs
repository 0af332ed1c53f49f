// Domain models: samples in, report out

mod report;
mod sample;

pub use report::{
    AggregateStats, FirstChange, LatencySummary, ObservationWindow, Report, TriggerResult,
    WindowSnapshot,
};
pub use sample::{Sample, SampleError, SampleRecord};
