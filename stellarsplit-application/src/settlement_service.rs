use crate::{
    error::SettlementServiceError,
    model::{GroupId, PersonBalance, SettlementResult},
    ports::LedgerReader,
};
use stellarsplit_domain::{BalanceAggregator, MemberBalances, SettlementResolver};

/// Reads a group's ledger and turns it into balances and a settlement plan.
///
/// Every call recomputes from the ledger; nothing is cached between calls.
#[derive(Clone, Copy)]
pub struct SettlementService<'a> {
    ledger: &'a dyn LedgerReader,
}

impl<'a> SettlementService<'a> {
    pub fn new(ledger: &'a dyn LedgerReader) -> Self {
        Self { ledger }
    }

    pub fn balances(&self, group: GroupId) -> Result<MemberBalances, SettlementServiceError> {
        let roster = self.ledger.members(group)?;
        let expenses = self.ledger.expenses(group)?;

        BalanceAggregator
            .aggregate(&roster, &expenses)
            .map_err(|source| SettlementServiceError::Aggregation { group, source })
    }

    pub fn settlement(&self, group: GroupId) -> Result<SettlementResult, SettlementServiceError> {
        let roster = self.ledger.members(group)?;
        let expenses = self.ledger.expenses(group)?;

        let balances = BalanceAggregator
            .aggregate(&roster, &expenses)
            .map_err(|source| SettlementServiceError::Aggregation { group, source })?;
        let plan = SettlementResolver
            .resolve_within(&balances, &roster)
            .map_err(|source| SettlementServiceError::Resolution { group, source })?;

        tracing::debug!(
            group = %group,
            expense_count = expenses.len(),
            transfer_count = plan.len(),
            "Settlement computed from ledger"
        );

        Ok(SettlementResult {
            balances: PersonBalance::from_balances(&balances),
            plan,
        })
    }
}
