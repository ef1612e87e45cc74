//! Intake validation.
//!
//! Two payload shapes are accepted and normalized into one
//! [`NewTransaction`]:
//!
//! - current: `{senderAddress, destinationAddress, amount, escrowTxHash,
//!   escrowWallet?, chainId?}`, amount in ether
//! - legacy: `{tx_hash, sender, destination, amount_wei}`, amount in wei

use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::escrow::amount::Amount;
use crate::escrow::error::ValidationError;
use crate::escrow::types::NewTransaction;

/// Raw intake payload; either profile's fields may be present.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IntakeRequest {
    #[serde(rename = "senderAddress")]
    pub sender_address: Option<String>,
    #[serde(rename = "destinationAddress")]
    pub destination_address: Option<String>,
    pub amount: Option<Value>,
    #[serde(rename = "escrowTxHash")]
    pub escrow_tx_hash: Option<String>,
    #[serde(rename = "escrowWallet")]
    pub escrow_wallet: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<u64>,

    // Legacy profile
    pub tx_hash: Option<String>,
    pub sender: Option<String>,
    pub destination: Option<String>,
    pub amount_wei: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    Current,
    Legacy,
}

impl IntakeRequest {
    fn profile(&self) -> Profile {
        let has_current = self.sender_address.is_some()
            || self.destination_address.is_some()
            || self.escrow_tx_hash.is_some()
            || self.amount.is_some();
        let has_legacy = self.tx_hash.is_some()
            || self.sender.is_some()
            || self.destination.is_some()
            || self.amount_wei.is_some();

        if has_legacy && !has_current {
            Profile::Legacy
        } else {
            Profile::Current
        }
    }

    /// Validate and normalize.
    pub fn validate(self) -> Result<NewTransaction, ValidationError> {
        match self.profile() {
            Profile::Current => {
                let sender_address = required("senderAddress", self.sender_address)?;
                let destination_address = required("destinationAddress", self.destination_address)?;
                let amount = ether_amount(self.amount.ok_or(ValidationError::MissingField("amount"))?)?;
                let escrow_tx_hash = tx_hash(
                    "escrowTxHash",
                    required("escrowTxHash", self.escrow_tx_hash)?,
                )?;
                Ok(NewTransaction {
                    sender_address,
                    destination_address,
                    amount,
                    escrow_tx_hash,
                    escrow_wallet: self.escrow_wallet.filter(|w| !w.trim().is_empty()),
                    chain_id: self.chain_id,
                })
            }
            Profile::Legacy => {
                let escrow_tx_hash = tx_hash("tx_hash", required("tx_hash", self.tx_hash)?)?;
                let sender_address = required("sender", self.sender)?;
                let destination_address = required("destination", self.destination)?;
                let amount = wei_amount(self.amount_wei.ok_or(ValidationError::MissingField("amount_wei"))?)?;
                Ok(NewTransaction {
                    sender_address,
                    destination_address,
                    amount,
                    escrow_tx_hash,
                    escrow_wallet: None,
                    chain_id: self.chain_id,
                })
            }
        }
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn tx_hash(field: &'static str, value: String) -> Result<TxHash, ValidationError> {
    let hex = value.strip_prefix("0x").unwrap_or(&value);
    if hex.len() != 64 {
        return Err(ValidationError::InvalidField {
            field,
            reason: "expected a 32-byte hex transaction hash".to_string(),
        });
    }
    value.parse().map_err(|_| ValidationError::InvalidField {
        field,
        reason: "expected a 32-byte hex transaction hash".to_string(),
    })
}

fn ether_amount(value: Value) -> Result<Amount, ValidationError> {
    let amount: Amount = serde_json::from_value(value).map_err(|e| ValidationError::InvalidField {
        field: "amount",
        reason: e.to_string(),
    })?;
    positive(amount)
}

fn wei_amount(value: Value) -> Result<Amount, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidField {
        field: "amount_wei",
        reason: reason.to_string(),
    };
    let wei = match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("expected a non-negative integer"));
            }
            s.parse::<U256>().map_err(|_| invalid("out of range"))?
        }
        Value::Number(n) => U256::from(n.as_u64().ok_or_else(|| invalid("expected a non-negative integer"))?),
        _ => return Err(invalid("expected an integer or decimal string")),
    };
    positive(Amount::from_wei(wei))
}

fn positive(amount: Amount) -> Result<Amount, ValidationError> {
    if amount.is_zero() {
        Err(ValidationError::NonPositiveAmount)
    } else {
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HASH: &str = "0xe1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1";

    fn parse(value: Value) -> Result<NewTransaction, ValidationError> {
        serde_json::from_value::<IntakeRequest>(value).unwrap().validate()
    }

    #[test]
    fn test_current_profile() {
        let new = parse(json!({
            "senderAddress": "0xA",
            "destinationAddress": "0xB",
            "amount": 1.0,
            "escrowTxHash": HASH,
            "escrowWallet": "0xE",
            "chainId": 11155111
        }))
        .unwrap();

        assert_eq!(new.amount, Amount::parse_ether("1").unwrap());
        assert_eq!(new.escrow_tx_hash, TxHash::repeat_byte(0xe1));
        assert_eq!(new.escrow_wallet.as_deref(), Some("0xE"));
        assert_eq!(new.chain_id, Some(11155111));
    }

    #[test]
    fn test_legacy_profile() {
        let new = parse(json!({
            "tx_hash": HASH,
            "sender": "0xA",
            "destination": "0xB",
            "amount_wei": "1000000000000000000"
        }))
        .unwrap();

        assert_eq!(new.amount, Amount::parse_ether("1").unwrap());
        assert_eq!(new.sender_address, "0xA");
    }

    #[test]
    fn test_missing_fields() {
        let err = parse(json!({
            "senderAddress": "0xA",
            "amount": "1",
            "escrowTxHash": HASH
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("destinationAddress"));

        let err = parse(json!({})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("senderAddress"));

        let err = parse(json!({
            "senderAddress": "  ",
            "destinationAddress": "0xB",
            "amount": "1",
            "escrowTxHash": HASH
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("senderAddress"));
    }

    #[test]
    fn test_non_positive_amounts() {
        for amount in [json!(0), json!("0.0"), json!(-1), json!("-0.5")] {
            let err = parse(json!({
                "senderAddress": "0xA",
                "destinationAddress": "0xB",
                "amount": amount,
                "escrowTxHash": HASH
            }))
            .unwrap_err();
            assert!(
                matches!(err, ValidationError::NonPositiveAmount | ValidationError::InvalidField { .. }),
                "unexpected error {:?}",
                err
            );
        }

        let err = parse(json!({
            "tx_hash": HASH, "sender": "0xA", "destination": "0xB", "amount_wei": 0
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveAmount);
    }

    #[test]
    fn test_malformed_hash() {
        let err = parse(json!({
            "senderAddress": "0xA",
            "destinationAddress": "0xB",
            "amount": "1",
            "escrowTxHash": "0x1234"
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "escrowTxHash", .. }));
    }
}
