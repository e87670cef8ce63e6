//! Typed gateway responses.
//!
//! - `Balance`: wallet balances returned by the balance enquiry
//! - `UssdTransaction`: USSD cash-out deposit codes and their status
//! - `WalletTransaction`, `TransactionQuery`: transaction history
//! - `ErrorResponse`: structured error body returned on failures

pub mod balance;
pub mod error_response;
pub mod transaction;
pub mod ussd;

pub use balance::Balance;
pub use error_response::ErrorResponse;
pub use transaction::{Receipt, TransactionQuery, WalletTransaction};
pub use ussd::UssdTransaction;
