use std::fmt;
use stellarsplit_domain::{MemberBalances, MemberId, Money, SettlementPlan};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonBalance {
    pub id: MemberId,
    pub balance: Money,
}

impl PersonBalance {
    pub fn from_balances(balances: &MemberBalances) -> Vec<Self> {
        balances
            .iter()
            .map(|(id, balance)| Self {
                id: id.clone(),
                balance: *balance,
            })
            .collect()
    }
}

/// Balances and the plan that settles them, computed from one ledger snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    pub balances: Vec<PersonBalance>,
    pub plan: SettlementPlan,
}
