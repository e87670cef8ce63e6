use serde::{Deserialize, Deserializer, Serialize};

/// Wallet balances for the logged-in agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default, deserialize_with = "amount")]
    pub income: f64,
    #[serde(default, deserialize_with = "amount")]
    pub main: f64,
}

/// The gateway sends amounts as decimal strings ("5000.000000"); accept
/// plain numbers as well.
fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_amounts() {
        let balance: Balance =
            serde_json::from_str(r#"{"income": "5000.000000","main": "1000.000000"}"#).unwrap();
        assert_eq!(balance.income, 5000.0);
        assert_eq!(balance.main, 1000.0);
    }

    #[test]
    fn test_parse_numeric_and_missing_amounts() {
        let balance: Balance = serde_json::from_str(r#"{"main": 12.5}"#).unwrap();
        assert_eq!(balance.income, 0.0);
        assert_eq!(balance.main, 12.5);
    }

    #[test]
    fn test_reject_non_numeric_amount() {
        assert!(serde_json::from_str::<Balance>(r#"{"income": "lots"}"#).is_err());
    }
}
