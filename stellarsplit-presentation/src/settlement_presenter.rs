use crate::{
    currency::{CurrencyProfile, mask_address},
    text_table::{Alignment, TextTableBuilder},
};
use std::borrow::Cow;
use stellarsplit_application::{MemberDirectory, PersonBalance, SettlementResult};
use stellarsplit_domain::{MemberId, Transfer};

const STELLAR_ADDRESS_LEN: usize = 56;

pub struct SettlementPresenter {
    currency: CurrencyProfile,
}

pub struct SettlementView {
    pub balance_table: String,
    /// `None` when everyone is already settled.
    pub transfer_table: Option<String>,
}

impl SettlementPresenter {
    pub fn new(currency: CurrencyProfile) -> Self {
        Self { currency }
    }

    pub fn render(&self, result: &SettlementResult) -> SettlementView {
        let empty_directory = EmptyMemberDirectory;
        self.render_with_members(result, &empty_directory)
    }

    pub fn render_with_members(
        &self,
        result: &SettlementResult,
        member_directory: &dyn MemberDirectory,
    ) -> SettlementView {
        let balance_table = self.build_balance_table(&result.balances, member_directory);
        let transfer_table = (!result.plan.is_empty())
            .then(|| self.build_transfer_table(result.plan.transfers(), member_directory));

        SettlementView {
            balance_table,
            transfer_table,
        }
    }

    pub fn build_balance_table(
        &self,
        person_balances: &[PersonBalance],
        member_directory: &dyn MemberDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed("Member"),
            Cow::Owned(format!("Balance ({})", self.currency.code)),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right])
            .headers(&headers);

        for person in person_balances {
            builder = builder.row([
                format_member_label(&person.id, member_directory),
                Cow::Owned(self.currency.format_signed(person.balance)),
            ]);
        }

        builder.build()
    }

    pub fn build_transfer_table(
        &self,
        transfers: &[Transfer],
        member_directory: &dyn MemberDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed("From"),
            Cow::Borrowed("To"),
            Cow::Owned(format!("Amount ({})", self.currency.code)),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Left, Alignment::Right])
            .headers(&headers);

        // Plan order is the order transfers should be executed in; keep it.
        for transfer in transfers {
            builder = builder.row([
                format_member_label(&transfer.from, member_directory),
                format_member_label(&transfer.to, member_directory),
                Cow::Owned(self.currency.format_amount(transfer.amount)),
            ]);
        }

        builder.build()
    }
}

struct EmptyMemberDirectory;

impl MemberDirectory for EmptyMemberDirectory {
    fn display_name(&self, _member_id: &MemberId) -> Option<&str> {
        None
    }
}

fn format_member_label<'a>(
    member_id: &MemberId,
    member_directory: &'a dyn MemberDirectory,
) -> Cow<'a, str> {
    match member_directory.display_name(member_id) {
        Some(name) => Cow::Borrowed(name),
        None if member_id.as_str().len() == STELLAR_ADDRESS_LEN => {
            Cow::Owned(mask_address(member_id.as_str(), 4, 4))
        }
        None => Cow::Owned(member_id.to_string()),
    }
}
