use crate::{
    error::ResolutionError,
    model::{MemberBalances, MemberId, Money, Roster, SettlementPlan, Transfer},
};
use std::{cmp::Reverse, collections::BinaryHeap};

/// Greedy max-creditor / max-debtor settlement.
///
/// Each step matches the largest outstanding credit with the largest
/// outstanding debt, so every step zeroes at least one party and the plan
/// has at most `n - 1` transfers for `n` non-zero balances. This is not a
/// global optimum for every input; exact minimisation is NP-hard.
pub struct SettlementResolver;

/// Heap entry: larger magnitude first, then the smaller member id.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Party {
    magnitude: Money,
    member: Reverse<MemberId>,
}

impl Party {
    fn new(member: MemberId, magnitude: Money) -> Self {
        Self {
            magnitude,
            member: Reverse(member),
        }
    }

    fn id(&self) -> &MemberId {
        &self.member.0
    }
}

impl SettlementResolver {
    /// Computes the settlement plan for `balances`.
    ///
    /// Balances must sum to zero; anything else is rejected before a single
    /// transfer is produced. An empty or fully settled map yields an empty plan.
    pub fn resolve(&self, balances: &MemberBalances) -> Result<SettlementPlan, ResolutionError> {
        let total = balances
            .values()
            .try_fold(Money::ZERO, |acc, balance| acc.checked_add(*balance))
            .ok_or(ResolutionError::AmountOverflow)?;
        if !total.is_zero() {
            tracing::error!(
                reject_reason = "input_imbalance",
                member_count = balances.len(),
                total = %total,
                "Settlement rejected due to non-conserving balances"
            );
            return Err(ResolutionError::BalanceIntegrity { total });
        }

        let mut creditors = BinaryHeap::new();
        let mut debtors = BinaryHeap::new();
        for (member, balance) in balances {
            if balance.is_positive() {
                creditors.push(Party::new(member.clone(), *balance));
            } else if balance.is_negative() {
                let owed = balance
                    .checked_neg()
                    .ok_or(ResolutionError::AmountOverflow)?;
                debtors.push(Party::new(member.clone(), owed));
            }
        }

        let limit = 2 * balances.len();
        let mut iterations = 0;
        let mut transfers = Vec::with_capacity(balances.len().saturating_sub(1));

        loop {
            let (creditor, debtor) = match (creditors.pop(), debtors.pop()) {
                (None, None) => break,
                (Some(creditor), Some(debtor)) => (creditor, debtor),
                (Some(leftover), None) => {
                    return Err(ResolutionError::BalanceIntegrity {
                        total: leftover.magnitude,
                    });
                }
                (None, Some(leftover)) => {
                    return Err(ResolutionError::BalanceIntegrity {
                        total: -leftover.magnitude,
                    });
                }
            };

            iterations += 1;
            if iterations > limit {
                tracing::error!(
                    reject_reason = "iteration_limit",
                    limit,
                    member_count = balances.len(),
                    "Settlement loop exceeded its iteration bound"
                );
                return Err(ResolutionError::IterationLimitExceeded { limit });
            }

            let amount = creditor.magnitude.min(debtor.magnitude);
            transfers.push(Transfer {
                from: debtor.id().clone(),
                to: creditor.id().clone(),
                amount,
            });

            let creditor_left = creditor.magnitude - amount;
            if !creditor_left.is_zero() {
                creditors.push(Party {
                    magnitude: creditor_left,
                    member: creditor.member,
                });
            }
            let debtor_left = debtor.magnitude - amount;
            if !debtor_left.is_zero() {
                debtors.push(Party {
                    magnitude: debtor_left,
                    member: debtor.member,
                });
            }
        }

        tracing::debug!(
            member_count = balances.len(),
            transfer_count = transfers.len(),
            "Settlement plan computed"
        );

        Ok(SettlementPlan::new(transfers))
    }

    /// Like [`resolve`](Self::resolve), but also rejects balances for members
    /// outside `roster`.
    pub fn resolve_within(
        &self,
        balances: &MemberBalances,
        roster: &Roster,
    ) -> Result<SettlementPlan, ResolutionError> {
        if let Some(stranger) = balances.keys().find(|member| !roster.contains(member)) {
            tracing::error!(
                reject_reason = "member_not_in_group",
                member = %stranger,
                "Settlement rejected due to unknown member"
            );
            return Err(ResolutionError::MemberNotInGroup(stranger.clone()));
        }
        self.resolve(balances)
    }
}
