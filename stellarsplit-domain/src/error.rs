use crate::model::{MemberId, Money};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("member {0} is listed more than once")]
    DuplicateMember(MemberId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpenseError {
    #[error("expense amount must be positive (got {0})")]
    NonPositiveAmount(Money),
    #[error("expense must be split among at least one member")]
    EmptySplit,
    #[error("member {0} appears more than once in the split")]
    DuplicateSplitMember(MemberId),
}

/// Which side of an expense referenced a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpenseRole {
    Payer,
    SplitMember,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("expense #{expense_index} references {member} ({role:?}) who is not in the group")]
    MemberNotInGroup {
        member: MemberId,
        role: ExpenseRole,
        expense_index: usize,
    },
    #[error("balance of {member} overflowed while folding expense #{expense_index}")]
    AmountOverflow {
        member: MemberId,
        expense_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("balances do not sum to zero (found {total})")]
    BalanceIntegrity { total: Money },
    #[error("balance for {0} does not belong to the group")]
    MemberNotInGroup(MemberId),
    #[error("balances are too large to settle without overflow")]
    AmountOverflow,
    #[error("settlement did not converge within {limit} iterations")]
    IterationLimitExceeded { limit: usize },
}
