use crate::converters::responses::ResponsesRequest;
use crate::request_id::RequestId;
use crate::token_store::TokenProvider;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::{debug, info, warn};

pub const ORIGINATOR: &str = "codex_cli_rs";

/// Client for the Codex Responses endpoint.
#[derive(Debug, Clone)]
pub struct CodexClient {
    http_client: reqwest::Client,
    upstream_url: String,
}

impl CodexClient {
    pub fn new(http_client: reqwest::Client, upstream_url: impl Into<String>) -> Self {
        Self {
            http_client,
            upstream_url: upstream_url.into(),
        }
    }

    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// Posts one translated request. The caller decides what to do with a
    /// non-success status; only transport failures are errors here.
    pub async fn forward(
        &self,
        request: &ResponsesRequest,
        tokens: &dyn TokenProvider,
        request_id: &RequestId,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut target_request = self
            .http_client
            .post(&self.upstream_url)
            .header(AUTHORIZATION, format!("Bearer {}", tokens.current_access_token()))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .header("OpenAI-Beta", "responses=experimental")
            .header("originator", ORIGINATOR);

        if let Some(account_id) = tokens.account_id() {
            match HeaderValue::from_str(&account_id) {
                Ok(val) => target_request = target_request.header("chatgpt-account-id", val),
                Err(e) => warn!("Invalid account id header value: {}", e),
            }
        }
        if let Ok(val) = HeaderValue::from_str(&request_id.0) {
            target_request = target_request.header("session_id", val);
        }

        info!("Forwarding request to: {}", self.upstream_url);
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                "request body: {}",
                serde_json::to_string(request).unwrap_or_default()
            );
        }
        target_request.json(request).send().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::StaticTokens;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> ResponsesRequest {
        ResponsesRequest {
            model: "gpt-5.3-codex".to_string(),
            input: Vec::new(),
            instructions: "Be brief.".to_string(),
            tools: None,
            tool_choice: None,
            stream: true,
            store: false,
        }
    }

    #[tokio::test]
    async fn test_forward_sends_codex_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/backend-api/codex/responses")
            .match_header("authorization", "Bearer tok_123")
            .match_header("chatgpt-account-id", "acct_9")
            .match_header("accept", "text/event-stream")
            .match_header("openai-beta", "responses=experimental")
            .match_header("originator", "codex_cli_rs")
            .match_header("session_id", "req-1")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-5.3-codex",
                "instructions": "Be brief.",
                "stream": true,
                "store": false
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = CodexClient::new(
            reqwest::Client::new(),
            format!("{}/backend-api/codex/responses", server.url()),
        );
        let tokens = StaticTokens {
            account_id: Some("acct_9".to_string()),
            ..StaticTokens::new("tok_123")
        };
        let response = client
            .forward(&request(), &tokens, &RequestId("req-1".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_account_header_omitted_when_unknown() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/responses")
            .match_header("chatgpt-account-id", Matcher::Missing)
            .with_status(200)
            .create_async()
            .await;

        let client = CodexClient::new(reqwest::Client::new(), format!("{}/responses", server.url()));
        let tokens = StaticTokens::new("tok_123");
        client
            .forward(&request(), &tokens, &RequestId("req-2".to_string()))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
