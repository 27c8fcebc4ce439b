//! SMS delivery through the Twilio messages endpoint.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;

use relay_common::config::AppConfig;

use crate::{NotifierError, SmsSender};

/// SMS sender backed by Twilio.
pub struct TwilioSmsSender {
    client: Client,
    url: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioSmsSender {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, NotifierError> {
        let url = url.into();
        let account_sid = account_sid.into();
        let auth_token = auth_token.into();

        if url.is_empty() || account_sid.is_empty() || auth_token.is_empty() {
            return Err(NotifierError::Config(
                "TWILIO_URL, TWILIO_AUTH_TOKEN, and TWILIO_ACCOUNT_SID must be set".to_string(),
            ));
        }

        Ok(Self {
            client,
            url,
            account_sid,
            auth_token,
        })
    }

    pub fn from_config(client: Client, config: &AppConfig) -> Result<Self, NotifierError> {
        Self::new(
            client,
            &config.twilio_url,
            &config.twilio_account_sid,
            &config.twilio_auth_token,
        )
    }

    fn request(&self, to: &str, from: &str, payload: &str) -> reqwest::RequestBuilder {
        self.client
            .post(&self.url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(ACCEPT, "application/json")
            .form(&[("To", to), ("From", from), ("Body", payload)])
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, to: &str, from: &str, payload: &str) -> Result<bool, NotifierError> {
        let resp = self.request(to, from, payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifierError::rejected("sms", to, status.as_u16(), body));
        }

        let body = resp.text().await.unwrap_or_default();
        let sid = message_sid(&body);
        tracing::info!(
            to,
            sid = sid.as_deref().unwrap_or("unknown"),
            "SMS sent successfully"
        );
        Ok(true)
    }
}

/// `sid` from a success body, if the body is readable JSON.
fn message_sid(body: &str) -> Option<String> {
    let data: serde_json::Value = serde_json::from_str(body).ok()?;
    data.get("sid").and_then(|v| v.as_str()).map(str::to_string)
}
