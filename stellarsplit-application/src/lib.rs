#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod ports;
pub mod settlement_service;

pub use error::{LedgerReadError, SettlementServiceError};
pub use model::{GroupId, PersonBalance, SettlementResult};
pub use ports::{LedgerReader, MemberDirectory};
pub use settlement_service::SettlementService;
