//! MetaMask / EVM transfer verification
//!
//! The buyer sends native tokens to the shop wallet and submits the
//! transaction hash. We look the transaction up over JSON-RPC and accept it
//! only when it succeeded, went to our wallet and carried enough value.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::prelude::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::PaymentError;
use crate::utils::money::to_decimal;

/// Wei per token (10^18)
const WEI_PER_TOKEN: u64 = 1_000_000_000_000_000_000;

/// `eth_getTransactionByHash` result (fields we use)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creation
    pub to: Option<String>,
    /// Hex quantity in wei
    pub value: String,
    pub block_number: Option<String>,
    pub chain_id: Option<String>,
}

/// `eth_getTransactionReceipt` result (fields we use)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// `0x1` success, `0x0` reverted
    pub status: Option<String>,
    pub block_number: Option<String>,
}

/// Read access to an EVM node
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn transaction(&self, hash: &str) -> Result<Option<RpcTransaction>, PaymentError>;
    async fn receipt(&self, hash: &str) -> Result<Option<RpcReceipt>, PaymentError>;
    async fn block_number(&self) -> Result<u64, PaymentError>;
}

/// JSON-RPC 2.0 over HTTP
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorBody>,
}

impl JsonRpcClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, PaymentError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let resp = self.http.post(&self.url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(PaymentError::Provider(format!(
                "{method} failed with HTTP {}",
                resp.status()
            )));
        }

        let rpc: RpcResponse = resp.json().await?;
        if let Some(err) = rpc.error {
            return Err(PaymentError::Provider(format!(
                "{method} error {}: {}",
                err.code, err.message
            )));
        }
        serde_json::from_value(rpc.result)
            .map_err(|e| PaymentError::Transport(format!("Unreadable {method} result: {e}")))
    }
}

#[async_trait]
impl ChainRpc for JsonRpcClient {
    async fn transaction(&self, hash: &str) -> Result<Option<RpcTransaction>, PaymentError> {
        self.call("eth_getTransactionByHash", json!([hash])).await
    }

    async fn receipt(&self, hash: &str) -> Result<Option<RpcReceipt>, PaymentError> {
        self.call("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn block_number(&self) -> Result<u64, PaymentError> {
        let hex: String = self.call("eth_blockNumber", json!([])).await?;
        parse_hex_u64(&hex)
            .ok_or_else(|| PaymentError::Transport(format!("Invalid block number {hex}")))
    }
}

/// What the shop expects to receive
#[derive(Debug, Clone)]
pub struct ExpectedTransfer<'a> {
    pub wallet_address: &'a str,
    pub chain_id: u64,
    pub amount_wei: u128,
    pub min_confirmations: u64,
}

/// A transfer that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransfer {
    pub tx_hash: String,
    pub from: String,
    pub value_wei: u128,
}

/// `0x` + 64 hex chars, returned lower-cased
pub fn normalize_tx_hash(hash: &str) -> Result<String, PaymentError> {
    let hash = hash.trim();
    let valid = hash.len() == 66
        && (hash.starts_with("0x") || hash.starts_with("0X"))
        && hash[2..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(PaymentError::InvalidTransactionHash);
    }
    Ok(hash.to_ascii_lowercase())
}

/// `floor(total / fiat_per_token × 10^18)`
pub fn expected_wei(total: f64, fiat_per_token: f64) -> Result<u128, PaymentError> {
    if !fiat_per_token.is_finite() || fiat_per_token <= 0.0 {
        return Err(PaymentError::NotConfigured("crypto exchange rate"));
    }
    let tokens = to_decimal(total) / to_decimal(fiat_per_token);
    tokens
        .checked_mul(Decimal::from(WEI_PER_TOKEN))
        .map(|wei| wei.floor())
        .and_then(|wei| wei.to_u128())
        .ok_or_else(|| PaymentError::Verification("Amount out of range".into()))
}

pub fn parse_hex_u128(value: &str) -> Option<u128> {
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))?;
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, 16).ok()
}

pub fn parse_hex_u64(value: &str) -> Option<u64> {
    parse_hex_u128(value).and_then(|v| u64::try_from(v).ok())
}

/// Look a transaction up and check it against `expected`
pub async fn verify_transfer(
    rpc: &dyn ChainRpc,
    tx_hash: &str,
    expected: &ExpectedTransfer<'_>,
) -> Result<VerifiedTransfer, PaymentError> {
    let tx_hash = normalize_tx_hash(tx_hash)?;

    let tx = rpc
        .transaction(&tx_hash)
        .await?
        .ok_or_else(|| PaymentError::Verification("Transaction not found".into()))?;

    if let Some(chain_id) = tx.chain_id.as_deref().and_then(parse_hex_u64)
        && chain_id != expected.chain_id
    {
        return Err(PaymentError::Verification(format!(
            "Transaction is on chain {chain_id}, expected {}",
            expected.chain_id
        )));
    }

    let receipt = rpc
        .receipt(&tx_hash)
        .await?
        .ok_or_else(|| PaymentError::Pending("Transaction not mined yet".into()))?;

    if receipt.status.as_deref() != Some("0x1") {
        return Err(PaymentError::Verification("Transaction failed on chain".into()));
    }

    let to_matches = tx
        .to
        .as_deref()
        .is_some_and(|to| to.eq_ignore_ascii_case(expected.wallet_address));
    if !to_matches {
        return Err(PaymentError::Verification(
            "Transaction recipient is not the shop wallet".into(),
        ));
    }

    let value_wei = parse_hex_u128(&tx.value)
        .ok_or_else(|| PaymentError::Verification("Unreadable transaction value".into()))?;
    if value_wei < expected.amount_wei {
        return Err(PaymentError::Verification(format!(
            "Transferred {value_wei} wei, expected at least {}",
            expected.amount_wei
        )));
    }

    if expected.min_confirmations > 0 {
        let mined_in = receipt
            .block_number
            .as_deref()
            .or(tx.block_number.as_deref())
            .and_then(parse_hex_u64)
            .ok_or_else(|| PaymentError::Pending("Transaction not mined yet".into()))?;
        let head = rpc.block_number().await?;
        let confirmations = head.saturating_sub(mined_in) + 1;
        if confirmations < expected.min_confirmations {
            return Err(PaymentError::Pending(format!(
                "{confirmations} of {} confirmations",
                expected.min_confirmations
            )));
        }
    }

    Ok(VerifiedTransfer {
        tx_hash,
        from: tx.from,
        value_wei,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xAbC0000000000000000000000000000000000001";
    const HASH: &str = "0x8f5e5b3c1d2a4f6e7b8c9d0e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c";

    struct FakeRpc {
        tx: Option<RpcTransaction>,
        receipt: Option<RpcReceipt>,
        head: u64,
    }

    #[async_trait]
    impl ChainRpc for FakeRpc {
        async fn transaction(&self, _: &str) -> Result<Option<RpcTransaction>, PaymentError> {
            Ok(self.tx.clone())
        }
        async fn receipt(&self, _: &str) -> Result<Option<RpcReceipt>, PaymentError> {
            Ok(self.receipt.clone())
        }
        async fn block_number(&self) -> Result<u64, PaymentError> {
            Ok(self.head)
        }
    }

    fn rpc(to: &str, value_wei: u128, status: &str) -> FakeRpc {
        FakeRpc {
            tx: Some(RpcTransaction {
                hash: HASH.into(),
                from: "0x00000000000000000000000000000000000000ff".into(),
                to: Some(to.into()),
                value: format!("0x{value_wei:x}"),
                block_number: Some("0x64".into()),
                chain_id: Some("0x1".into()),
            }),
            receipt: Some(RpcReceipt {
                status: Some(status.into()),
                block_number: Some("0x64".into()),
            }),
            head: 100,
        }
    }

    fn expected(amount_wei: u128, min_confirmations: u64) -> ExpectedTransfer<'static> {
        ExpectedTransfer {
            wallet_address: WALLET,
            chain_id: 1,
            amount_wei,
            min_confirmations,
        }
    }

    #[test]
    fn test_normalize_tx_hash() {
        assert_eq!(normalize_tx_hash(&HASH.to_uppercase().replace("0X", "0x")).unwrap(), HASH);
        assert!(normalize_tx_hash("0x1234").is_err());
        assert!(normalize_tx_hash(&HASH.replace("0x", "")).is_err());
        assert!(normalize_tx_hash(&HASH.replace('c', "z")).is_err());
    }

    #[test]
    fn test_expected_wei() {
        // 1,500,000 VND at 75,000,000 VND per ETH = 0.02 ETH
        assert_eq!(
            expected_wei(1_500_000.0, 75_000_000.0).unwrap(),
            20_000_000_000_000_000
        );
        // Floors fractional wei
        assert_eq!(expected_wei(1.0, 3.0).unwrap(), 333_333_333_333_333_333);
        assert!(expected_wei(1.0, 0.0).is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex_u128("0x0"), Some(0));
        assert_eq!(parse_hex_u128("0x"), Some(0));
        assert_eq!(parse_hex_u128("0xde0b6b3a7640000"), Some(1_000_000_000_000_000_000));
        assert_eq!(parse_hex_u128("12"), None);
        assert_eq!(parse_hex_u64("0x64"), Some(100));
    }

    #[tokio::test]
    async fn test_verify_success_with_case_insensitive_wallet() {
        let fake = rpc(&WALLET.to_lowercase(), 2_000, "0x1");
        let verified = verify_transfer(&fake, HASH, &expected(2_000, 0)).await.unwrap();
        assert_eq!(verified.value_wei, 2_000);
        assert_eq!(verified.tx_hash, HASH);
    }

    #[tokio::test]
    async fn test_verify_rejections() {
        let wrong_wallet = rpc("0x0000000000000000000000000000000000000002", 2_000, "0x1");
        assert!(matches!(
            verify_transfer(&wrong_wallet, HASH, &expected(2_000, 0)).await,
            Err(PaymentError::Verification(_))
        ));

        let reverted = rpc(WALLET, 2_000, "0x0");
        assert!(matches!(
            verify_transfer(&reverted, HASH, &expected(2_000, 0)).await,
            Err(PaymentError::Verification(_))
        ));

        let short = rpc(WALLET, 1_999, "0x1");
        assert!(matches!(
            verify_transfer(&short, HASH, &expected(2_000, 0)).await,
            Err(PaymentError::Verification(_))
        ));

        let mut other_chain = rpc(WALLET, 2_000, "0x1");
        if let Some(tx) = other_chain.tx.as_mut() {
            tx.chain_id = Some("0x38".into());
        }
        assert!(verify_transfer(&other_chain, HASH, &expected(2_000, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_pending() {
        let mut unmined = rpc(WALLET, 2_000, "0x1");
        unmined.receipt = None;
        assert!(matches!(
            verify_transfer(&unmined, HASH, &expected(2_000, 0)).await,
            Err(PaymentError::Pending(_))
        ));

        // Mined in block 100, head 100: one confirmation
        let fresh = rpc(WALLET, 2_000, "0x1");
        assert!(matches!(
            verify_transfer(&fresh, HASH, &expected(2_000, 3)).await,
            Err(PaymentError::Pending(_))
        ));

        let mut settled = rpc(WALLET, 2_000, "0x1");
        settled.head = 102;
        assert!(verify_transfer(&settled, HASH, &expected(2_000, 3)).await.is_ok());
    }
}
