pub mod balance_aggregator;
pub mod settlement_resolver;

pub use balance_aggregator::{BalanceAccumulator, BalanceAggregator};
pub use settlement_resolver::SettlementResolver;
