#![warn(clippy::uninlined_format_args)]

pub mod currency;
pub mod settlement_presenter;
pub mod text_table;

pub use currency::{AmountParseError, CurrencyProfile, mask_address};
pub use settlement_presenter::{SettlementPresenter, SettlementView};
