//! Email delivery through the Resend HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use relay_common::config::AppConfig;

use crate::{EmailSender, NotifierError};

/// JSON body accepted by `POST /emails`.
#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
    text: &'a str,
}

impl<'a> ResendEmail<'a> {
    fn new(to: &'a str, from: &'a str, payload: &'a str, subject: &'a str) -> Self {
        Self {
            from,
            to: [to],
            subject,
            html: format!("<div>{}</div>", payload),
            text: payload,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

impl ResendResponse {
    /// Message id from a success body. The status already confirmed the send,
    /// so an unreadable body only loses the id.
    fn message_id(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body).ok().and_then(|r| r.id)
    }
}

/// Email sender backed by Resend.
pub struct ResendEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ResendEmailSender {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, NotifierError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(NotifierError::Config(
                "RESEND_API_KEY must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(client: Client, config: &AppConfig) -> Result<Self, NotifierError> {
        Self::new(client, &config.resend_api_url, &config.resend_api_key)
    }

    fn request(
        &self,
        to: &str,
        from: &str,
        payload: &str,
        subject: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&ResendEmail::new(to, from, payload, subject))
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(
        &self,
        to: &str,
        from: &str,
        html_payload: &str,
        subject: &str,
    ) -> Result<bool, NotifierError> {
        let resp = self.request(to, from, html_payload, subject).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifierError::rejected("email", to, status.as_u16(), body));
        }

        let body = resp.text().await.unwrap_or_default();
        let message_id = ResendResponse::message_id(&body);
        tracing::info!(
            to,
            message_id = message_id.as_deref().unwrap_or("unknown"),
            "Email sent"
        );
        Ok(true)
    }
}
