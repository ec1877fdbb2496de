use crate::{error::LedgerReadError, model::GroupId};
use std::collections::HashMap;
use stellarsplit_domain::{Expense, MemberId, Roster};

/// Read access to the authoritative ledger of a group.
///
/// The ledger may live in contract storage or in a local demo store; the
/// settlement code only ever sees this interface.
pub trait LedgerReader: Send + Sync {
    fn members(&self, group: GroupId) -> Result<Roster, LedgerReadError>;

    /// Expenses in recording order.
    fn expenses(&self, group: GroupId) -> Result<Vec<Expense>, LedgerReadError>;
}

pub trait MemberDirectory: Send + Sync {
    fn display_name(&self, member_id: &MemberId) -> Option<&str>;
}

impl MemberDirectory for HashMap<MemberId, String> {
    fn display_name(&self, member_id: &MemberId) -> Option<&str> {
        self.get(member_id).map(String::as_str)
    }
}
