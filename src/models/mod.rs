pub mod farm;
pub mod market;
pub mod transaction;

pub use farm::FarmPool;
pub use farm::FarmPools;
pub use market::PricePoint;
pub use market::SpotPrice;
pub use transaction::Transaction;
pub use transaction::TransactionKind;
pub use transaction::TransactionPage;
pub use transaction::TransactionStatus;
