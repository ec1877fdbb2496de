#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod in_memory_ledger;

pub use error::LedgerError;
pub use in_memory_ledger::{
    ExpenseId, ExpenseRecord, GroupSummary, InMemoryLedger, MAX_GROUP_NAME_LEN, MIN_MEMBERS,
};
