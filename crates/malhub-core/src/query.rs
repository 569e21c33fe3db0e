//! Iteration-scoped queries over the performed node log.
//!
//! Only the log carries history; every other entity already holds just
//! its latest value and is returned whole.

use malhub_types::{Iteration, PerformedNode};

/// Which performed node records a query selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PerformedNodeFilter {
    /// The whole log.
    #[default]
    All,
    /// Records whose iteration equals the given one.
    Exactly(Iteration),
    /// Records whose iteration is at least the given one.
    From(Iteration),
}

impl PerformedNodeFilter {
    /// Build a filter from the optional `iter` and `from_iter` parameters.
    ///
    /// An exact iteration wins when both are supplied.
    pub const fn from_params(iter: Option<Iteration>, from_iter: Option<Iteration>) -> Self {
        match (iter, from_iter) {
            (Some(n), _) => Self::Exactly(n),
            (None, Some(n)) => Self::From(n),
            (None, None) => Self::All,
        }
    }

    /// Whether `node` is selected by this filter.
    pub const fn matches(self, node: &PerformedNode) -> bool {
        match self {
            Self::All => true,
            Self::Exactly(n) => node.iteration == n,
            Self::From(n) => node.iteration >= n,
        }
    }

    /// The matching records of `log`, in log order.
    pub fn apply(self, log: &[PerformedNode]) -> Vec<PerformedNode> {
        match self {
            Self::All => log.to_vec(),
            _ => log.iter().filter(|node| self.matches(node)).copied().collect(),
        }
    }
}

/// Highest iteration present in `log`.
pub fn latest_iteration(log: &[PerformedNode]) -> Option<Iteration> {
    log.iter().map(|node| node.iteration).max()
}
