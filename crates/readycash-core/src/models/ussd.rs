use serde::{Deserialize, Serialize};

/// A USSD cash-out code generated for a deposit into the agent wallet.
///
/// `user_defined_reference` is not part of the gateway payload; the client
/// fills it in with the reference the caller used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdTransaction {
    #[serde(default)]
    pub user_defined_reference: String,
    #[serde(default)]
    pub merchant_ref: String,
    #[serde(default)]
    pub transaction_ref: String,
    #[serde(default)]
    pub ussd_string: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub response_code: String,
    #[serde(default)]
    pub transaction_date: Option<i64>,
    #[serde(default)]
    pub expiry_date: Option<i64>,
    #[serde(default)]
    pub completion_date: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_ref: Option<String>,
    #[serde(default)]
    pub payer_phone: Option<String>,
    #[serde(default)]
    pub payment_bank: Option<String>,
    #[serde(default)]
    pub payment_network: Option<String>,
    #[serde(default)]
    pub payment_bank_code: Option<String>,
}

impl UssdTransaction {
    /// True once the payer has completed the deposit.
    pub fn is_completed(&self) -> bool {
        self.completion_date.is_some_and(|d| d > 0)
    }
}
