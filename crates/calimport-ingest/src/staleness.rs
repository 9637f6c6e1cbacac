//! Dropping events that are already over.

use chrono::{DateTime, Utc};

use crate::mapping::EventTiming;

/// Rejects events whose effective end falls before a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessFilter {
    cutoff: DateTime<Utc>,
}

impl StalenessFilter {
    /// Creates a filter with the given cutoff instant.
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// The cutoff instant.
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Returns true if the event ended (or, without an end, started) before the cutoff.
    pub fn is_stale(&self, timing: &EventTiming) -> bool {
        timing.effective_end().with_timezone(&Utc) < self.cutoff
    }
}
