use arcstr::ArcStr;
use fxhash::{FxBuildHasher, FxHashSet};
use indexmap::{IndexMap, IndexSet};
use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use crate::error::{ExpenseError, RosterError};

/// Opaque member identifier (a Stellar address in practice).
///
/// Ordering is lexicographic on the address and is the fixed member
/// ordering every deterministic tie-break relies on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(pub ArcStr);

impl MemberId {
    pub fn new(address: impl Into<ArcStr>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(ArcStr::from(value))
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(ArcStr::from(value))
    }
}

/// Amount in the smallest currency unit (stroops for XLM).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i128);

impl Money {
    pub const ZERO: Self = Self(0);

    pub const fn from_units(units: i128) -> Self {
        Self(units)
    }

    pub fn from_i64(value: i64) -> Self {
        Self(i128::from(value))
    }

    pub const fn units(self) -> i128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn signum(self) -> i128 {
        self.0.signum()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_neg(self) -> Option<Self> {
        self.0.checked_neg().map(Self)
    }

    pub fn checked_abs(self) -> Option<Self> {
        self.0.checked_abs().map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Net balance per member, kept in roster order.
pub type MemberBalances = IndexMap<MemberId, Money, FxBuildHasher>;

/// Authoritative, duplicate-free member set of a group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    members: IndexSet<MemberId, FxBuildHasher>,
}

impl Roster {
    pub fn try_new<I>(members: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = MemberId>,
    {
        let mut roster = Self::default();
        for member in members {
            roster.insert(member)?;
        }
        Ok(roster)
    }

    pub fn insert(&mut self, member: MemberId) -> Result<(), RosterError> {
        if self.members.contains(&member) {
            return Err(RosterError::DuplicateMember(member));
        }
        self.members.insert(member);
        Ok(())
    }

    /// Removes `member`, keeping the order of the remaining members.
    pub fn remove(&mut self, member: &MemberId) -> bool {
        self.members.shift_remove(member)
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> + '_ {
        self.members.iter()
    }

    /// A zero entry for every member, in roster order.
    pub fn zero_balances(&self) -> MemberBalances {
        self.members
            .iter()
            .map(|member| (member.clone(), Money::ZERO))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a MemberId;
    type IntoIter = indexmap::set::Iter<'a, MemberId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// A single recorded expense. Description and category live with the
/// ledger record; the settlement math never looks at them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    payer: MemberId,
    amount: Money,
    split_among: Vec<MemberId>,
}

impl Expense {
    pub fn try_new<I>(payer: MemberId, amount: Money, split_among: I) -> Result<Self, ExpenseError>
    where
        I: IntoIterator<Item = MemberId>,
    {
        if !amount.is_positive() {
            return Err(ExpenseError::NonPositiveAmount(amount));
        }

        let split_among: Vec<MemberId> = split_among.into_iter().collect();
        if split_among.is_empty() {
            return Err(ExpenseError::EmptySplit);
        }

        let mut seen = FxHashSet::default();
        for member in &split_among {
            if !seen.insert(member) {
                return Err(ExpenseError::DuplicateSplitMember(member.clone()));
            }
        }

        Ok(Self {
            payer,
            amount,
            split_among,
        })
    }

    pub fn payer(&self) -> &MemberId {
        &self.payer
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn split_among(&self) -> &[MemberId] {
        &self.split_among
    }

    /// Each split member paired with the share debited from them.
    pub fn shares(&self) -> impl Iterator<Item = (&MemberId, Money)> + '_ {
        self.split_among
            .iter()
            .zip(split_evenly(self.amount, self.split_among.len()))
    }
}

/// Splits `amount` into `count` integer shares that sum exactly to `amount`.
///
/// The first `amount mod count` shares carry one extra unit.
pub fn split_evenly(amount: Money, count: usize) -> Vec<Money> {
    if count == 0 {
        return Vec::new();
    }

    let divisor = count as i128;
    let total = amount.units();
    let base = total / divisor;
    let remainder = (total % divisor).unsigned_abs() as usize;
    let step = total.signum();

    (0..count)
        .map(|idx| {
            let mut share = base;
            if idx < remainder {
                share += step;
            }
            Money::from_units(share)
        })
        .collect()
}

/// One settlement instruction: `from` (a debtor) pays `to` (a creditor).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.amount)
    }
}

/// Ordered list of transfers that zeroes every balance it was computed from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettlementPlan {
    transfers: Vec<Transfer>,
}

impl SettlementPlan {
    pub fn new(transfers: Vec<Transfer>) -> Self {
        Self { transfers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn into_transfers(self) -> Vec<Transfer> {
        self.transfers
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transfer> {
        self.transfers.iter()
    }

    pub fn total(&self) -> Money {
        self.transfers
            .iter()
            .fold(Money::ZERO, |acc, transfer| acc + transfer.amount)
    }

    /// Applies every transfer: the payer moves up towards zero, the
    /// receiver moves down towards zero.
    pub fn apply_to(&self, balances: &mut MemberBalances) {
        for transfer in &self.transfers {
            *balances
                .entry(transfer.from.clone())
                .or_insert(Money::ZERO) += transfer.amount;
            *balances.entry(transfer.to.clone()).or_insert(Money::ZERO) -= transfer.amount;
        }
    }
}

impl IntoIterator for SettlementPlan {
    type Item = Transfer;
    type IntoIter = std::vec::IntoIter<Transfer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transfers.into_iter()
    }
}

impl<'a> IntoIterator for &'a SettlementPlan {
    type Item = &'a Transfer;
    type IntoIter = std::slice::Iter<'a, Transfer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transfers.iter()
    }
}
