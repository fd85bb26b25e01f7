//! Chat platform REST client.
//!
//! Used by both transports to answer interactions and edit the original
//! response, and by the CLI to install command definitions.

use std::time::Duration;

use async_trait::async_trait;
use bookclub_kernel::interaction::InteractionCallback;
use bookclub_kernel::settings::PlatformSettings;
use bookclub_kernel::Reply;
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

const USER_AGENT: &str = "DiscordBot (https://github.com/bookclub/bookclub, 0.1.0)";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("missing platform credential: {0}")]
    MissingCredential(&'static str),
}

/// Outbound interaction calls, implemented over REST and faked in tests.
#[async_trait]
pub trait InteractionApi: Send + Sync {
    /// Send the initial response to an interaction.
    async fn create_response(
        &self,
        interaction_id: &str,
        token: &str,
        callback: &InteractionCallback,
    ) -> Result<(), PlatformError>;

    /// Replace the content and components of the initial response.
    async fn edit_original(&self, token: &str, reply: &Reply) -> Result<(), PlatformError>;
}

pub struct RestClient {
    http_client: reqwest::Client,
    api_base: String,
    application_id: String,
    bot_token: String,
}

impl RestClient {
    pub fn new(settings: &PlatformSettings) -> Result<Self, PlatformError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            application_id: settings.application_id.clone(),
            bot_token: settings.bot_token.clone(),
        })
    }

    fn application_id(&self) -> Result<&str, PlatformError> {
        if self.application_id.is_empty() {
            return Err(PlatformError::MissingCredential("application_id"));
        }
        Ok(&self.application_id)
    }

    /// Overwrite the application's global commands.
    pub async fn install_commands(
        &self,
        definitions: &[serde_json::Value],
    ) -> Result<(), PlatformError> {
        if self.bot_token.is_empty() {
            return Err(PlatformError::MissingCredential("bot_token"));
        }
        let endpoint = format!("applications/{}/commands", self.application_id()?);
        self.request(Method::PUT, &endpoint, definitions, true).await?;
        tracing::info!(count = definitions.len(), "installed global commands");
        Ok(())
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        authorized: bool,
    ) -> Result<(), PlatformError> {
        let url = format!("{}/{}", self.api_base, endpoint);
        tracing::debug!(method = %method, url = %url, "platform request");

        let mut request = self.http_client.request(method, &url).json(body);
        if authorized {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", self.bot_token),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api(status.as_u16(), error_text));
        }
        Ok(())
    }
}

#[async_trait]
impl InteractionApi for RestClient {
    async fn create_response(
        &self,
        interaction_id: &str,
        token: &str,
        callback: &InteractionCallback,
    ) -> Result<(), PlatformError> {
        let endpoint = format!("interactions/{}/{}/callback", interaction_id, token);
        self.request(Method::POST, &endpoint, callback, false).await
    }

    async fn edit_original(&self, token: &str, reply: &Reply) -> Result<(), PlatformError> {
        let endpoint = format!(
            "webhooks/{}/{}/messages/@original",
            self.application_id()?,
            token
        );
        let body = json!({
            "content": reply.content,
            "components": reply.components,
        });
        self.request(Method::PATCH, &endpoint, &body, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(application_id: &str) -> PlatformSettings {
        PlatformSettings {
            api_base: "http://127.0.0.1:9/api/".to_string(),
            application_id: application_id.to_string(),
            ..PlatformSettings::default()
        }
    }

    #[test]
    fn test_api_base_is_normalized() {
        let client = RestClient::new(&settings("app")).unwrap();
        assert_eq!(client.api_base, "http://127.0.0.1:9/api");
    }

    #[tokio::test]
    async fn test_edit_requires_application_id() {
        let client = RestClient::new(&settings("")).unwrap();
        let err = client
            .edit_original("tok", &Reply::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::MissingCredential("application_id")));
    }

    #[tokio::test]
    async fn test_install_requires_bot_token() {
        let client = RestClient::new(&settings("app")).unwrap();
        let err = client.install_commands(&[]).await.unwrap_err();
        assert!(matches!(err, PlatformError::MissingCredential("bot_token")));
    }
}
