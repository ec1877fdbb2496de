use crate::error::LedgerError;
use dashmap::DashMap;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use stellarsplit_application::{GroupId, LedgerReadError, LedgerReader};
use stellarsplit_domain::{
    BalanceAggregator, Expense, MemberId, Money, Roster, SettlementPlan, SettlementResolver,
};

pub const MAX_GROUP_NAME_LEN: usize = 64;
pub const MIN_MEMBERS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(pub u64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub expense: Expense,
    pub description: String,
    pub category: String,
}

/// Read-only view of a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<MemberId>,
    pub expense_count: usize,
    pub settled: bool,
}

struct GroupRecord {
    name: String,
    roster: Roster,
    expenses: Vec<ExpenseRecord>,
    settled: bool,
}

impl GroupRecord {
    fn ensure_open(&self, id: GroupId) -> Result<(), LedgerError> {
        if self.settled {
            return Err(LedgerError::GroupSettled(id));
        }
        Ok(())
    }

    fn ensure_member(&self, member: &MemberId) -> Result<(), LedgerError> {
        if !self.roster.contains(member) {
            return Err(LedgerError::NotAMember(member.clone()));
        }
        Ok(())
    }

    fn references(&self, member: &MemberId) -> bool {
        self.expenses.iter().any(|record| {
            record.expense.payer() == member || record.expense.split_among().contains(member)
        })
    }
}

/// Demo-mode ledger store kept entirely in memory.
///
/// Mirrors the group lifecycle of the on-chain contract: groups are created,
/// expenses recorded or cancelled, the roster edited, and finally the group
/// is settled, after which it is frozen.
#[derive(Default)]
pub struct InMemoryLedger {
    groups: DashMap<GroupId, GroupRecord>,
    next_group_id: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a group. The creator is added to `members` when missing.
    pub fn create_group<I>(
        &self,
        creator: MemberId,
        name: &str,
        members: I,
    ) -> Result<GroupId, LedgerError>
    where
        I: IntoIterator<Item = MemberId>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        let len = name.chars().count();
        if len > MAX_GROUP_NAME_LEN {
            return Err(LedgerError::NameTooLong {
                len,
                max: MAX_GROUP_NAME_LEN,
            });
        }

        let mut roster = Roster::try_new(members)?;
        if !roster.contains(&creator) {
            roster.insert(creator.clone())?;
        }
        if roster.len() < MIN_MEMBERS {
            return Err(LedgerError::TooFewMembers { min: MIN_MEMBERS });
        }

        let id = GroupId(self.next_group_id.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            group = %id,
            creator = %creator,
            member_count = roster.len(),
            "Group created"
        );
        self.groups.insert(
            id,
            GroupRecord {
                name: name.to_string(),
                roster,
                expenses: Vec::new(),
                settled: false,
            },
        );
        Ok(id)
    }

    pub fn add_expense<I>(
        &self,
        group: GroupId,
        payer: MemberId,
        amount: Money,
        split_among: I,
        description: &str,
        category: &str,
    ) -> Result<ExpenseId, LedgerError>
    where
        I: IntoIterator<Item = MemberId>,
    {
        let mut record = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        record.ensure_open(group)?;
        record.ensure_member(&payer)?;

        let expense = Expense::try_new(payer, amount, split_among)?;
        for member in expense.split_among() {
            record.ensure_member(member)?;
        }

        let id = ExpenseId(record.expenses.len() as u64);
        tracing::info!(
            group = %group,
            expense = %id,
            payer = %expense.payer(),
            amount = %expense.amount(),
            split_count = expense.split_among().len(),
            "Expense recorded"
        );
        record.expenses.push(ExpenseRecord {
            id,
            expense,
            description: description.to_string(),
            category: category.to_string(),
        });
        Ok(id)
    }

    /// Drops the most recent expense. Only its payer may do so.
    pub fn cancel_last_expense(
        &self,
        group: GroupId,
        caller: &MemberId,
    ) -> Result<ExpenseRecord, LedgerError> {
        let mut record = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        record.ensure_open(group)?;

        let last = record.expenses.last().ok_or(LedgerError::NoExpenses)?;
        if last.expense.payer() != caller {
            return Err(LedgerError::NotExpensePayer {
                payer: last.expense.payer().clone(),
            });
        }

        let cancelled = record.expenses.pop().ok_or(LedgerError::NoExpenses)?;
        tracing::info!(group = %group, expense = %cancelled.id, "Expense cancelled");
        Ok(cancelled)
    }

    pub fn add_member(
        &self,
        group: GroupId,
        caller: &MemberId,
        new_member: MemberId,
    ) -> Result<(), LedgerError> {
        let mut record = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        record.ensure_open(group)?;
        record.ensure_member(caller)?;
        if record.roster.contains(&new_member) {
            return Err(LedgerError::AlreadyMember(new_member));
        }

        tracing::info!(group = %group, member = %new_member, "Member added");
        record.roster.insert(new_member)?;
        Ok(())
    }

    /// Removes a member who has no recorded expenses.
    ///
    /// Balances are always computed against the current roster, so a member
    /// still referenced by the ledger must stay.
    pub fn remove_member(
        &self,
        group: GroupId,
        caller: &MemberId,
        member: &MemberId,
    ) -> Result<(), LedgerError> {
        let mut record = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        record.ensure_open(group)?;
        record.ensure_member(caller)?;
        if record.roster.len() <= MIN_MEMBERS {
            return Err(LedgerError::TooFewMembers { min: MIN_MEMBERS });
        }
        record.ensure_member(member)?;
        if record.references(member) {
            return Err(LedgerError::MemberHasExpenses(member.clone()));
        }

        record.roster.remove(member);
        tracing::info!(group = %group, member = %member, "Member removed");
        Ok(())
    }

    /// Computes the settlement plan and freezes the group.
    ///
    /// Executing the transfers is left to the caller.
    pub fn settle_group(
        &self,
        group: GroupId,
        settler: &MemberId,
    ) -> Result<SettlementPlan, LedgerError> {
        let mut record = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        record.ensure_open(group)?;
        record.ensure_member(settler)?;

        let expenses: Vec<Expense> = record
            .expenses
            .iter()
            .map(|expense| expense.expense.clone())
            .collect();
        let balances = BalanceAggregator.aggregate(&record.roster, &expenses)?;
        let plan = SettlementResolver.resolve_within(&balances, &record.roster)?;

        record.settled = true;
        tracing::info!(
            group = %group,
            settler = %settler,
            transfer_count = plan.len(),
            "Group settled"
        );
        Ok(plan)
    }

    pub fn group(&self, group: GroupId) -> Result<GroupSummary, LedgerError> {
        let record = self
            .groups
            .get(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        Ok(GroupSummary {
            id: group,
            name: record.name.clone(),
            members: record.roster.iter().cloned().collect(),
            expense_count: record.expenses.len(),
            settled: record.settled,
        })
    }

    pub fn expense(&self, group: GroupId, expense: ExpenseId) -> Result<ExpenseRecord, LedgerError> {
        let record = self
            .groups
            .get(&group)
            .ok_or(LedgerError::GroupNotFound(group))?;
        record
            .expenses
            .iter()
            .find(|candidate| candidate.id == expense)
            .cloned()
            .ok_or(LedgerError::ExpenseNotFound { group, expense })
    }

    pub fn is_settled(&self, group: GroupId) -> Result<bool, LedgerError> {
        self.groups
            .get(&group)
            .map(|record| record.settled)
            .ok_or(LedgerError::GroupNotFound(group))
    }
}

impl LedgerReader for InMemoryLedger {
    fn members(&self, group: GroupId) -> Result<Roster, LedgerReadError> {
        self.groups
            .get(&group)
            .map(|record| record.roster.clone())
            .ok_or(LedgerReadError::GroupNotFound(group))
    }

    fn expenses(&self, group: GroupId) -> Result<Vec<Expense>, LedgerReadError> {
        self.groups
            .get(&group)
            .map(|record| {
                record
                    .expenses
                    .iter()
                    .map(|expense| expense.expense.clone())
                    .collect()
            })
            .ok_or(LedgerReadError::GroupNotFound(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use stellarsplit_application::SettlementService;
    use stellarsplit_domain::{ExpenseError, RosterError};

    fn member(name: &str) -> MemberId {
        MemberId::from(name)
    }

    fn everyone() -> [MemberId; 3] {
        [member("A"), member("B"), member("C")]
    }

    #[fixture]
    fn ledger() -> (InMemoryLedger, GroupId) {
        let ledger = InMemoryLedger::new();
        let group = ledger
            .create_group(member("A"), "Cappadocia trip", [member("B"), member("C")])
            .expect("group created");
        (ledger, group)
    }

    #[rstest]
    fn create_group_adds_creator_last(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;

        let summary = ledger.group(group).expect("group exists");

        assert_eq!(summary.members, vec![member("B"), member("C"), member("A")]);
        assert_eq!(summary.name, "Cappadocia trip");
        assert!(!summary.settled);
    }

    #[rstest]
    #[case::empty_name("   ", vec!["B"], LedgerError::EmptyName)]
    #[case::long_name(
        &"x".repeat(65),
        vec!["B"],
        LedgerError::NameTooLong { len: 65, max: MAX_GROUP_NAME_LEN }
    )]
    #[case::alone("solo", vec![], LedgerError::TooFewMembers { min: MIN_MEMBERS })]
    #[case::duplicate(
        "dupes",
        vec!["B", "B"],
        LedgerError::Roster(RosterError::DuplicateMember(MemberId::from("B")))
    )]
    fn create_group_validation(
        #[case] name: &str,
        #[case] members: Vec<&str>,
        #[case] expected: LedgerError,
    ) {
        let ledger = InMemoryLedger::new();

        let err = ledger
            .create_group(member("A"), name, members.into_iter().map(member))
            .unwrap_err();

        assert_eq!(err, expected);
    }

    #[rstest]
    fn group_ids_are_sequential() {
        let ledger = InMemoryLedger::new();
        let first = ledger
            .create_group(member("A"), "one", [member("B")])
            .expect("first group");
        let second = ledger
            .create_group(member("A"), "two", [member("B")])
            .expect("second group");

        assert_eq!(first, GroupId(0));
        assert_eq!(second, GroupId(1));
    }

    #[rstest]
    fn add_expense_validates_membership_and_amount(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;

        let outsider = ledger
            .add_expense(group, member("Z"), Money::from_i64(10), everyone(), "", "")
            .unwrap_err();
        assert_eq!(outsider, LedgerError::NotAMember(member("Z")));

        let stranger_split = ledger
            .add_expense(
                group,
                member("A"),
                Money::from_i64(10),
                [member("A"), member("Q")],
                "",
                "",
            )
            .unwrap_err();
        assert_eq!(stranger_split, LedgerError::NotAMember(member("Q")));

        let zero = ledger
            .add_expense(group, member("A"), Money::ZERO, everyone(), "", "")
            .unwrap_err();
        assert_eq!(
            zero,
            LedgerError::Expense(ExpenseError::NonPositiveAmount(Money::ZERO))
        );

        assert_eq!(ledger.group(group).expect("group").expense_count, 0);
    }

    #[rstest]
    fn recorded_expense_is_retrievable(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;

        let id = ledger
            .add_expense(
                group,
                member("B"),
                Money::from_i64(600_000_000),
                everyone(),
                "Balloon ride",
                "eglence",
            )
            .expect("expense recorded");
        let record = ledger.expense(group, id).expect("expense exists");

        assert_eq!(id, ExpenseId(0));
        assert_eq!(record.description, "Balloon ride");
        assert_eq!(record.category, "eglence");
        assert_eq!(record.expense.payer(), &member("B"));
        assert_eq!(
            ledger.expense(group, ExpenseId(5)).unwrap_err(),
            LedgerError::ExpenseNotFound {
                group,
                expense: ExpenseId(5),
            }
        );
    }

    #[rstest]
    fn only_the_payer_cancels_the_last_expense(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;
        assert_eq!(
            ledger.cancel_last_expense(group, &member("A")).unwrap_err(),
            LedgerError::NoExpenses
        );

        ledger
            .add_expense(group, member("A"), Money::from_i64(90), everyone(), "", "")
            .expect("first expense");
        ledger
            .add_expense(group, member("B"), Money::from_i64(60), everyone(), "", "")
            .expect("second expense");

        assert_eq!(
            ledger.cancel_last_expense(group, &member("A")).unwrap_err(),
            LedgerError::NotExpensePayer { payer: member("B") }
        );

        let cancelled = ledger
            .cancel_last_expense(group, &member("B"))
            .expect("payer cancels");
        assert_eq!(cancelled.id, ExpenseId(1));
        assert_eq!(ledger.group(group).expect("group").expense_count, 1);

        let next = ledger
            .add_expense(group, member("C"), Money::from_i64(30), everyone(), "", "")
            .expect("id is reused");
        assert_eq!(next, ExpenseId(1));
    }

    #[rstest]
    fn roster_changes_follow_contract_rules(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;

        assert_eq!(
            ledger
                .add_member(group, &member("Z"), member("D"))
                .unwrap_err(),
            LedgerError::NotAMember(member("Z"))
        );
        assert_eq!(
            ledger
                .add_member(group, &member("A"), member("B"))
                .unwrap_err(),
            LedgerError::AlreadyMember(member("B"))
        );
        ledger
            .add_member(group, &member("A"), member("D"))
            .expect("member added");

        ledger
            .add_expense(group, member("A"), Money::from_i64(30), everyone(), "", "")
            .expect("expense recorded");
        assert_eq!(
            ledger
                .remove_member(group, &member("A"), &member("B"))
                .unwrap_err(),
            LedgerError::MemberHasExpenses(member("B"))
        );
        assert_eq!(
            ledger
                .remove_member(group, &member("A"), &member("X"))
                .unwrap_err(),
            LedgerError::NotAMember(member("X"))
        );

        ledger
            .remove_member(group, &member("A"), &member("D"))
            .expect("unused member removed");
        assert_eq!(
            ledger.group(group).expect("group").members,
            vec![member("B"), member("C"), member("A")]
        );
    }

    #[test]
    fn remove_member_keeps_minimum_roster() {
        let ledger = InMemoryLedger::new();
        let group = ledger
            .create_group(member("A"), "pair", [member("B")])
            .expect("group created");

        assert_eq!(
            ledger
                .remove_member(group, &member("A"), &member("B"))
                .unwrap_err(),
            LedgerError::TooFewMembers { min: MIN_MEMBERS }
        );
    }

    #[rstest]
    fn settle_group_returns_plan_and_freezes(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;
        ledger
            .add_expense(group, member("A"), Money::from_i64(90), everyone(), "", "")
            .expect("first expense");
        ledger
            .add_expense(group, member("B"), Money::from_i64(60), everyone(), "", "")
            .expect("second expense");

        let plan = ledger
            .settle_group(group, &member("C"))
            .expect("group settles");

        let transfers: Vec<(&str, &str, i128)> = plan
            .iter()
            .map(|t| (t.from.as_str(), t.to.as_str(), t.amount.units()))
            .collect();
        assert_eq!(transfers, vec![("C", "A", 40), ("C", "B", 10)]);
        assert!(ledger.is_settled(group).expect("group exists"));

        assert_eq!(
            ledger
                .add_expense(group, member("A"), Money::from_i64(1), everyone(), "", "")
                .unwrap_err(),
            LedgerError::GroupSettled(group)
        );
        assert_eq!(
            ledger.settle_group(group, &member("A")).unwrap_err(),
            LedgerError::GroupSettled(group)
        );
    }

    #[rstest]
    fn reader_port_matches_settle_group(ledger: (InMemoryLedger, GroupId)) {
        let (ledger, group) = ledger;
        ledger
            .add_expense(group, member("C"), Money::from_i64(100), everyone(), "", "")
            .expect("expense recorded");

        let preview = SettlementService::new(&ledger)
            .settlement(group)
            .expect("preview computed");
        let settled = ledger
            .settle_group(group, &member("A"))
            .expect("group settles");

        assert_eq!(preview.plan, settled);
        assert_eq!(
            ledger.members(GroupId(42)).unwrap_err(),
            LedgerReadError::GroupNotFound(GroupId(42))
        );
    }
}
