//! Typed gateway to the wallet agent backend.
//!
//! The gateway is the single seam across which the client talks to the
//! agent. Every request carries the opaque session id so the backend can
//! maintain per-session conversational and wallet context; the client holds
//! no other server-side identity.
//!
//! ## HTTP contract
//!
//! - `POST /chat` body `{ "session_id": .., "message": .. }` →
//!   `{ "response": .., "wallet": { .. } | null }`
//! - `GET /wallet/{session_id}` → `{ "wallet": { .. } | null }`
//!
//! Either a full structured reply comes back or the call fails; there is no
//! partial success. An absent wallet in a 2xx payload means "no active
//! wallet for this session" and is not an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// The backend's notion of the session's currently active wallet.
///
/// `address` is expected in 42-character `0x`-prefixed hex form. The backend
/// is authoritative; the client only ever caches a copy of this record.
/// `wallet_id` and `assets` ride along from the backend schema and play no
/// part in reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletRecord {
    pub address: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<AssetBalance>,
}

/// A token balance reported alongside the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetBalance {
    pub symbol: String,
    pub balance: String,
    #[serde(default)]
    pub decimals: Option<u32>,
}

/// Full structured reply to a chat message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub wallet: Option<WalletRecord>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct WalletEnvelope {
    #[serde(default)]
    wallet: Option<WalletRecord>,
}

/// Request/response seam to the remote wallet agent.
#[async_trait]
pub trait WalletAgentApi: Send + Sync {
    /// Send one user turn; the backend replies with text and, when the turn
    /// changed wallet state, the now-active wallet.
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<ChatReply, GatewayError>;

    /// Fetch the active wallet for the session, `None` when there is none.
    async fn fetch_wallet(
        &self,
        session_id: &str,
    ) -> Result<Option<WalletRecord>, GatewayError>;
}

/// HTTP implementation of [`WalletAgentApi`] over reqwest.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Gateway against `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl WalletAgentApi for HttpGateway {
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<ChatReply, GatewayError> {
        let endpoint = self.endpoint("/chat");
        tracing::debug!(%session_id, %endpoint, "sending chat message");

        let response = self
            .client
            .post(&endpoint)
            .json(&ChatRequest {
                session_id,
                message: text,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network {
                endpoint,
                reason: format!("status {status}"),
            });
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| GatewayError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            })
    }

    async fn fetch_wallet(
        &self,
        session_id: &str,
    ) -> Result<Option<WalletRecord>, GatewayError> {
        let endpoint = self.endpoint(&format!("/wallet/{session_id}"));
        tracing::debug!(%session_id, %endpoint, "fetching wallet");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network {
                endpoint,
                reason: format!("status {status}"),
            });
        }

        let envelope = response.json::<WalletEnvelope>().await.map_err(|e| {
            GatewayError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            }
        })?;
        Ok(envelope.wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_chat_reply_with_wallet() {
        let reply: ChatReply = serde_json::from_str(
            r#"{
                "response": "Wallet created successfully",
                "wallet": {
                    "wallet_id": "w-1",
                    "address": "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1111",
                    "network": "base-sepolia",
                    "assets": [
                        {"symbol": "ETH", "balance": "0.0001", "decimals": 18},
                        {"symbol": "USDC", "balance": "10", "decimals": 6}
                    ]
                }
            }"#,
        )
        .expect("reply should decode");

        assert_eq!(reply.response, "Wallet created successfully");
        let wallet = reply.wallet.expect("wallet present");
        assert_eq!(wallet.address, "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1111");
        assert_eq!(wallet.network, "base-sepolia");
        assert_eq!(wallet.assets.len(), 2);
        assert_eq!(wallet.assets[0].symbol, "ETH");
    }

    #[test]
    fn decodes_chat_reply_without_wallet_key() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response": "hello"}"#).expect("reply should decode");
        assert_eq!(reply.response, "hello");
        assert_eq!(reply.wallet, None);
    }

    #[test]
    fn decodes_empty_wallet_envelope_as_none() {
        let envelope: WalletEnvelope = serde_json::from_str("{}").expect("envelope");
        assert!(envelope.wallet.is_none());

        let envelope: WalletEnvelope =
            serde_json::from_str(r#"{"wallet": null}"#).expect("envelope");
        assert!(envelope.wallet.is_none());
    }

    #[test]
    fn rejects_reply_missing_response_field() {
        let result = serde_json::from_str::<ChatReply>(r#"{"wallet": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn chat_request_serializes_session_and_message() {
        let body = serde_json::to_value(ChatRequest {
            session_id: "session_1700000000000_abcd1234",
            message: "Create a new wallet",
        })
        .expect("request serializes");

        assert_eq!(body["session_id"], "session_1700000000000_abcd1234");
        assert_eq!(body["message"], "Create a new wallet");
    }

    #[test]
    fn builds_endpoints_off_the_base_url() {
        let gateway = HttpGateway::new("http://localhost:8000");
        assert_eq!(gateway.endpoint("/chat"), "http://localhost:8000/chat");
        assert_eq!(
            gateway.endpoint("/wallet/session_1_ab"),
            "http://localhost:8000/wallet/session_1_ab"
        );
    }
}
