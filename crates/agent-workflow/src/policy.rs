//! Termination policy: the hard cap on worker visits

/// Forces `Finish` once the visit budget is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    max_visits: usize,
}

impl TerminationPolicy {
    pub fn new(max_visits: usize) -> Self {
        Self { max_visits }
    }

    pub fn max_visits(&self) -> usize {
        self.max_visits
    }

    /// True when no further worker visit is allowed
    pub fn is_exhausted(&self, visit_count: usize) -> bool {
        visit_count >= self.max_visits
    }

    pub fn remaining(&self, visit_count: usize) -> usize {
        self.max_visits.saturating_sub(visit_count)
    }
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_VISITS)
    }
}
