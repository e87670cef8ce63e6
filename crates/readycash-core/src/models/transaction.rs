use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filters for the transaction history endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub tran_type: Option<String>,
    /// Only return transactions with an id after this one
    pub after: Option<i64>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

impl TransactionQuery {
    /// Query parameters in the gateway's naming.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref tran_type) = self.tran_type {
            pairs.push(("trantype", tran_type.clone()));
        }
        if let Some(after) = self.after {
            pairs.push(("after", after.to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.to_string()));
        }
        pairs
    }
}

/// Receipt details attached to a wallet transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tran_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

/// One entry of the agent wallet's transaction history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    #[serde(default)]
    pub debit: bool,
    #[serde(default)]
    pub tran_id: i64,
    #[serde(default)]
    pub tran_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub long_description: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub amount: f64,
    // Spelled this way on the wire
    #[serde(default, rename = "reciept")]
    pub receipt: Receipt,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub balance2: f64,
    #[serde(default)]
    pub logo_id: String,
}

impl WalletTransaction {
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_only_include_set_fields() {
        assert!(TransactionQuery::default().to_query_pairs().is_empty());

        let query = TransactionQuery {
            tran_type: Some("CASHOUT".to_string()),
            after: None,
            start_date: Some(1622307058),
            end_date: None,
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("trantype", "CASHOUT".to_string()),
                ("start_date", "1622307058".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_transaction_list() {
        let json = r#"[{
            "debit": false,
            "tranId": 88123,
            "tranType": "420.00.010.0000",
            "description": "Deposit",
            "narration": "AGENT POS CASHBACK 2039XK",
            "longDescription": "Money deposited using terminal 2039XK",
            "date": 1622307058834,
            "amount": 2500.5,
            "reciept": {"amount": 2500.5, "date": 1622307058834, "reference": "R-1", "recipient": "self"},
            "balance": 7500.5,
            "balance2": 0,
            "logoId": "cash"
        }]"#;

        let txs: Vec<WalletTransaction> = serde_json::from_str(json).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].tran_id, 88123);
        assert_eq!(txs[0].receipt.reference, "R-1");
        assert_eq!(txs[0].receipt.bank, None);
        assert_eq!(
            txs[0].date_time().map(|d| d.timestamp()),
            Some(1622307058)
        );
    }
}
