#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod services;

pub use error::{AggregationError, ExpenseError, ExpenseRole, ResolutionError, RosterError};
pub use model::{
    Expense, MemberBalances, MemberId, Money, Roster, SettlementPlan, Transfer, split_evenly,
};
pub use services::{BalanceAccumulator, BalanceAggregator, SettlementResolver};
