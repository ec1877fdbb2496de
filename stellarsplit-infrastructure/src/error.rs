use stellarsplit_application::GroupId;
use stellarsplit_domain::{
    AggregationError, ExpenseError, MemberId, ResolutionError, RosterError,
};

use crate::in_memory_ledger::ExpenseId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("group {0} does not exist")]
    GroupNotFound(GroupId),
    #[error("group {0} is already settled")]
    GroupSettled(GroupId),
    #[error("group name cannot be empty")]
    EmptyName,
    #[error("group name too long ({len} chars, max {max})")]
    NameTooLong { len: usize, max: usize },
    #[error("at least {min} members required")]
    TooFewMembers { min: usize },
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Expense(#[from] ExpenseError),
    #[error("{0} is not a member of the group")]
    NotAMember(MemberId),
    #[error("{0} is already a member of the group")]
    AlreadyMember(MemberId),
    #[error("{0} is referenced by recorded expenses and cannot be removed")]
    MemberHasExpenses(MemberId),
    #[error("no expenses to cancel")]
    NoExpenses,
    #[error("only the payer {payer} can cancel this expense")]
    NotExpensePayer { payer: MemberId },
    #[error("expense {expense} not found in group {group}")]
    ExpenseNotFound { group: GroupId, expense: ExpenseId },
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
