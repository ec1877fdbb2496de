use crate::model::GroupId;
use stellarsplit_domain::{AggregationError, ResolutionError};

/// Failures reported by a [`LedgerReader`](crate::ports::LedgerReader) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerReadError {
    #[error("group {0} does not exist")]
    GroupNotFound(GroupId),
    #[error("ledger backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerReadError),
    #[error("ledger for group {group} is corrupt: {source}")]
    Aggregation {
        group: GroupId,
        #[source]
        source: AggregationError,
    },
    #[error("cannot settle group {group}: {source}")]
    Resolution {
        group: GroupId,
        #[source]
        source: ResolutionError,
    },
}
