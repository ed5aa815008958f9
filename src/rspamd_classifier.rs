/*!
 * Copyright (c) 2026 Ming Lyu, aka mingcheng
 *
 * This source code is licensed under the MIT License,
 * which is located in the LICENSE file in the source tree's root directory.
 *
 * File: rspamd_classifier.rs
 * Author: mingcheng <mingcheng@apache.org>
 * File Created: 2026-10-19 10:40:02
 *
 * Modified By: mingcheng <mingcheng@apache.org>
 * Last Modified: 2026-10-19 11:12:47
 */

use crate::traits::{SpamClassifier, Verdict};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use serde::Deserialize;
use std::time::Duration;

/// The action rspamd reports for a clean message
const NO_ACTION: &str = "no action";

/// The subset of the `/checkv2` reply we care about.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default = "default_action")]
    action: String,
    score: Option<f64>,
    required_score: Option<f64>,
}

fn default_action() -> String {
    NO_ACTION.to_string()
}

/// A classifier that asks the rspamd HTTP controller for a verdict.
pub struct RspamdClassifier {
    client: Client,
    check_url: String,
}

impl RspamdClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            check_url: format!("{}/checkv2", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SpamClassifier for RspamdClassifier {
    async fn classify(&self, raw: &[u8]) -> anyhow::Result<Verdict> {
        let response = self
            .client
            .post(&self.check_url)
            .header(CONTENT_LENGTH, raw.len())
            .body(raw.to_vec())
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("rspamd request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("rspamd error: {} - {}", status, text);
            return Err(anyhow::anyhow!("rspamd error: {}", status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read rspamd response: {}", e))?;

        let check: CheckResponse = serde_json::from_slice(&body)
            .map_err(|e| anyhow::anyhow!("Malformed rspamd response: {}", e))?;

        debug!(
            "rspamd action={:?} score={:?} required_score={:?}",
            check.action, check.score, check.required_score
        );

        if check.action == NO_ACTION {
            Ok(Verdict::NotSpam)
        } else {
            Ok(Verdict::Spam)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const RAW: &[u8] = b"Subject: hello\r\n\r\nbody\r\n";

    fn classifier(url: &str) -> RspamdClassifier {
        let _ = rustls::crypto::ring::default_provider().install_default();
        RspamdClassifier::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_no_action_is_not_spam() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/checkv2")
            .match_header("content-length", RAW.len().to_string().as_str())
            .match_body(Matcher::Exact(String::from_utf8_lossy(RAW).into_owned()))
            .with_status(200)
            .with_body(r#"{"action":"no action","score":0.4,"required_score":15.0}"#)
            .create_async()
            .await;

        let verdict = classifier(&server.url()).classify(RAW).await.unwrap();

        assert_eq!(verdict, Verdict::NotSpam);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_actions_are_spam() {
        for action in ["add header", "rewrite subject", "greylist", "reject"] {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("POST", "/checkv2")
                .with_status(200)
                .with_body(serde_json::json!({ "action": action }).to_string())
                .create_async()
                .await;

            let verdict = classifier(&server.url()).classify(RAW).await.unwrap();

            assert_eq!(verdict, Verdict::Spam, "action {:?}", action);
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_missing_action_is_not_spam() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/checkv2")
            .with_status(200)
            .with_body(r#"{"score":3.2}"#)
            .create_async()
            .await;

        let verdict = classifier(&server.url()).classify(RAW).await.unwrap();

        assert_eq!(verdict, Verdict::NotSpam);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/checkv2")
            .with_status(200)
            .with_body(r#"{"action":"no action"}"#)
            .create_async()
            .await;

        let url = format!("{}/", server.url());
        let result = classifier(&url).classify(RAW).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/checkv2")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let result = classifier(&server.url()).classify(RAW).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/checkv2")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let result = classifier(&server.url()).classify(RAW).await;

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("Malformed rspamd response")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let result = classifier("http://127.0.0.1:9").classify(RAW).await;
        assert!(result.is_err());
    }
}
