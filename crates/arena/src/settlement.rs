//! Settlement of finished matches through an HTTP webhook.

use std::time::Duration;

use async_trait::async_trait;
use chess_core::Outcome;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::collab::{SettlementConnector, TxHandle};
use crate::error::SettlementError;

#[derive(Debug, Serialize)]
struct SettlementRequest<'a> {
    match_token: &'a str,
    outcome: Outcome,
    result: &'static str,
}

pub struct WebhookSettlement {
    client: Client,
    url: String,
}

impl WebhookSettlement {
    pub fn new(url: impl Into<String>) -> Result<Self, SettlementError> {
        let client = Client::builder()
            .user_agent("ChessArena/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SettlementError::Failed(format!("Client build error: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SettlementConnector for WebhookSettlement {
    async fn settle(&self, match_token: &str, outcome: Outcome) -> Result<TxHandle, SettlementError> {
        let body = SettlementRequest {
            match_token,
            outcome,
            result: outcome.result_token(),
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SettlementError::Failed(format!("Request error: {e}")))?;
        if !resp.status().is_success() {
            return Err(SettlementError::Failed(format!("HTTP {}", resp.status())));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| SettlementError::Failed(format!("Body read error: {e}")))?;
        tx_handle(&value).ok_or_else(|| SettlementError::Failed("Response has no tx".into()))
    }
}

fn tx_handle(response: &Value) -> Option<TxHandle> {
    response
        .get("tx")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| TxHandle(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Side;

    #[test]
    fn test_request_body() {
        let outcome = Outcome::Checkmate { winner: Side::White };
        let body = SettlementRequest {
            match_token: "abc",
            outcome,
            result: outcome.result_token(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["match_token"], "abc");
        assert_eq!(value["result"], "1-0");
        assert_eq!(value["outcome"]["result"], "checkmate");
        assert_eq!(value["outcome"]["winner"], "white");
    }

    #[test]
    fn test_tx_handle() {
        let ok = serde_json::json!({ "tx": "0xfeed" });
        assert_eq!(tx_handle(&ok), Some(TxHandle("0xfeed".into())));
        assert_eq!(tx_handle(&serde_json::json!({ "tx": "" })), None);
        assert_eq!(tx_handle(&serde_json::json!({ "status": "queued" })), None);
    }
}
