use crate::{
    error::{AggregationError, ExpenseRole},
    model::{Expense, MemberBalances, MemberId, Money, Roster},
};

/// Folds an ordered expense ledger into net balances for a fixed roster.
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Net balance for every roster member, including those at zero.
    ///
    /// Payers are credited the full amount and every split member is debited
    /// its share, so the result always sums to exactly zero.
    pub fn aggregate(
        &self,
        roster: &Roster,
        expenses: &[Expense],
    ) -> Result<MemberBalances, AggregationError> {
        let mut accumulator = BalanceAccumulator::new(roster);
        for expense in expenses {
            accumulator.apply(expense)?;
        }

        tracing::debug!(
            member_count = roster.len(),
            expense_count = expenses.len(),
            "Balances aggregated"
        );

        Ok(accumulator.into_balances())
    }
}

/// Incremental form of [`BalanceAggregator`]; applies one expense at a time.
pub struct BalanceAccumulator<'r> {
    roster: &'r Roster,
    balances: MemberBalances,
    applied: usize,
}

impl<'r> BalanceAccumulator<'r> {
    pub fn new(roster: &'r Roster) -> Self {
        Self {
            roster,
            balances: roster.zero_balances(),
            applied: 0,
        }
    }

    /// Applies `expense` atomically: on error the balances are unchanged.
    pub fn apply(&mut self, expense: &Expense) -> Result<(), AggregationError> {
        let expense_index = self.applied;
        self.ensure_member(expense.payer(), ExpenseRole::Payer, expense_index)?;
        for member in expense.split_among() {
            self.ensure_member(member, ExpenseRole::SplitMember, expense_index)?;
        }

        let mut staged = self.balances.clone();
        credit(&mut staged, expense.payer(), expense.amount(), expense_index)?;
        for (member, share) in expense.shares() {
            credit(&mut staged, member, -share, expense_index)?;
        }

        self.balances = staged;
        self.applied += 1;
        Ok(())
    }

    pub fn balances(&self) -> &MemberBalances {
        &self.balances
    }

    pub fn into_balances(self) -> MemberBalances {
        self.balances
    }

    fn ensure_member(
        &self,
        member: &MemberId,
        role: ExpenseRole,
        expense_index: usize,
    ) -> Result<(), AggregationError> {
        if self.roster.contains(member) {
            return Ok(());
        }

        tracing::error!(
            reject_reason = "member_not_in_group",
            member = %member,
            role = ?role,
            expense_index,
            "Expense references a member outside the roster"
        );
        Err(AggregationError::MemberNotInGroup {
            member: member.clone(),
            role,
            expense_index,
        })
    }
}

fn credit(
    balances: &mut MemberBalances,
    member: &MemberId,
    delta: Money,
    expense_index: usize,
) -> Result<(), AggregationError> {
    let overflow = || AggregationError::AmountOverflow {
        member: member.clone(),
        expense_index,
    };
    let balance = balances.get_mut(member).ok_or_else(overflow)?;
    *balance = balance.checked_add(delta).ok_or_else(overflow)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn member(name: &str) -> MemberId {
        MemberId::from(name)
    }

    fn expense(payer: &str, amount: i64, split: &[&str]) -> Expense {
        Expense::try_new(
            member(payer),
            Money::from_i64(amount),
            split.iter().copied().map(member),
        )
        .expect("valid expense")
    }

    #[fixture]
    fn roster() -> Roster {
        Roster::try_new([member("A"), member("B"), member("C")]).expect("valid roster")
    }

    fn as_pairs(balances: &MemberBalances) -> Vec<(&str, i128)> {
        balances
            .iter()
            .map(|(member, money)| (member.as_str(), money.units()))
            .collect()
    }

    #[rstest]
    #[case::no_expenses(vec![], vec![("A", 0), ("B", 0), ("C", 0)])]
    #[case::even_split(
        vec![expense("A", 90, &["A", "B", "C"])],
        vec![("A", 60), ("B", -30), ("C", -30)]
    )]
    #[case::two_expenses(
        vec![expense("A", 90, &["A", "B", "C"]), expense("B", 60, &["A", "B", "C"])],
        vec![("A", 40), ("B", 10), ("C", -50)]
    )]
    #[case::payer_outside_split(
        vec![expense("A", 50, &["B", "C"])],
        vec![("A", 50), ("B", -25), ("C", -25)]
    )]
    #[case::remainder_goes_to_first_split_members(
        vec![expense("C", 100, &["A", "B", "C"])],
        vec![("A", -34), ("B", -33), ("C", 67)]
    )]
    fn aggregate_cases(
        roster: Roster,
        #[case] expenses: Vec<Expense>,
        #[case] expected: Vec<(&str, i128)>,
    ) {
        let balances = BalanceAggregator
            .aggregate(&roster, &expenses)
            .expect("aggregation should succeed");

        assert_eq!(as_pairs(&balances), expected);
        let total: i128 = balances.values().map(|money| money.units()).sum();
        assert_eq!(total, 0);
    }

    #[rstest]
    fn rejects_payer_outside_roster(roster: Roster) {
        let expenses = vec![
            expense("A", 30, &["A", "B"]),
            expense("Z", 30, &["A", "B"]),
        ];

        let err = BalanceAggregator.aggregate(&roster, &expenses).unwrap_err();

        assert_eq!(
            err,
            AggregationError::MemberNotInGroup {
                member: member("Z"),
                role: ExpenseRole::Payer,
                expense_index: 1,
            }
        );
    }

    #[rstest]
    fn rejects_split_member_outside_roster(roster: Roster) {
        let expenses = vec![expense("A", 30, &["A", "X"])];

        let err = BalanceAggregator.aggregate(&roster, &expenses).unwrap_err();

        assert_eq!(
            err,
            AggregationError::MemberNotInGroup {
                member: member("X"),
                role: ExpenseRole::SplitMember,
                expense_index: 0,
            }
        );
    }

    #[rstest]
    fn failed_apply_leaves_balances_untouched(roster: Roster) {
        let mut accumulator = BalanceAccumulator::new(&roster);
        accumulator
            .apply(&expense("A", 30, &["A", "B", "C"]))
            .expect("valid expense applies");
        let before = accumulator.balances().clone();

        let result = accumulator.apply(&expense("B", 30, &["B", "Q"]));

        assert!(result.is_err());
        assert_eq!(accumulator.balances(), &before);
    }

    #[test]
    fn reports_overflow_instead_of_wrapping() {
        let roster = Roster::try_new([member("A"), member("B")]).expect("valid roster");
        let huge = Expense::try_new(member("A"), Money::from_units(i128::MAX), [member("B")])
            .expect("valid expense");

        let err = BalanceAggregator
            .aggregate(&roster, &[huge.clone(), huge])
            .unwrap_err();

        assert_eq!(
            err,
            AggregationError::AmountOverflow {
                member: member("A"),
                expense_index: 1,
            }
        );
    }
}
