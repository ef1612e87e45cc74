use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

type ClientResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub sender_address: String,
    pub destination_address: String,
    /// Ether, as a decimal string.
    pub amount: String,
    pub escrow_tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrow_wallet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// The fields of a relay record most callers care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub sender_address: String,
    pub destination_address: String,
    pub amount: String,
    pub escrow_tx_hash: String,
    pub status: String,
    pub forward_tx_hash: Option<String>,
    pub forwarded_amount: Option<String>,
    pub fee_kept: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub transaction: TransactionView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub transaction: TransactionView,
    pub escrow_verification: Option<serde_json::Value>,
    pub forward_verification: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub rpc_configured: bool,
    pub signer_configured: bool,
    pub escrow_address: Option<String>,
}

pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let resp = self.client.get(format!("{}/api/health", self.base_url)).send().await?;
        decode(resp).await
    }

    /// Register an escrow deposit for relaying.
    pub async fn submit(&self, req: &SubmitRequest) -> ClientResult<SubmitResponse> {
        let resp = self
            .client
            .post(format!("{}/api/transaction", self.base_url))
            .json(req)
            .send()
            .await?;
        decode(resp).await
    }

    /// Current record for `id`, or `None` if the relay does not know it.
    pub async fn get(&self, id: &str) -> ClientResult<Option<TransactionView>> {
        let resp = self
            .client
            .get(format!("{}/api/transaction/{}", self.base_url, id))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(resp).await.map(Some)
    }

    /// Records for `sender`, or every record when `sender` is `None`.
    pub async fn list(&self, sender: Option<&str>) -> ClientResult<ListResponse> {
        let mut req = self.client.get(format!("{}/api/transactions", self.base_url));
        if let Some(sender) = sender {
            req = req.query(&[("sender", sender)]);
        }
        decode(req.send().await?).await
    }

    /// Run one lifecycle step for `id` now.
    pub async fn verify(&self, id: &str) -> ClientResult<VerifyResponse> {
        let resp = self
            .client
            .post(format!("{}/api/verify", self.base_url))
            .json(&serde_json::json!({ "txId": id }))
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(format!("Relay returned error status {}: {}", status, text).into());
    }
    Ok(serde_json::from_str::<T>(&text)?)
}
