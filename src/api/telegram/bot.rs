use crate::api::{MessageFormat, NotificationSink};
use crate::config::TelegramCredentials;
use crate::error::DeliveryError;
use crate::monitor::message::STARTUP_NOTICE;
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

/// Sends alerts to one Telegram chat through the Bot API.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    credentials: TelegramCredentials,
}

impl TelegramNotifier {
    pub fn new(
        credentials: TelegramCredentials,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: TELEGRAM_API_URL.to_string(),
            credentials,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.credentials.bot_token, method)
    }

    async fn get_me(&self) -> Result<BotUser, DeliveryError> {
        let body = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await?
            .text()
            .await?;
        parse_response::<BotUser>(&body)?
            .ok_or_else(|| DeliveryError::Rejected("getMe returned no bot".to_string()))
    }
}

fn send_message_payload<'a>(
    chat_id: &'a str,
    text: &'a str,
    format: MessageFormat,
) -> SendMessage<'a> {
    SendMessage {
        chat_id,
        text,
        parse_mode: match format {
            MessageFormat::Rich => Some("HTML"),
            MessageFormat::Plain => None,
        },
    }
}

/// Telegram answers errors with `ok: false` and a description, often with a
/// 4xx status, so the body is inspected instead of the status code.
fn parse_response<T: for<'de> Deserialize<'de>>(body: &str) -> Result<Option<T>, DeliveryError> {
    let response: ApiResponse<T> = serde_json::from_str(body)?;
    if !response.ok {
        return Err(DeliveryError::Rejected(
            response
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(response.result)
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn deliver(&self, text: &str, format: MessageFormat) -> Result<(), DeliveryError> {
        let payload = send_message_payload(&self.credentials.chat_id, text, format);
        let body = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?
            .text()
            .await?;
        parse_response::<serde_json::Value>(&body)?;
        Ok(())
    }

    async fn self_test(&self) -> Result<(), DeliveryError> {
        let bot = self.get_me().await?;
        info!(
            "Telegram bot connected: @{}",
            bot.username.as_deref().unwrap_or("<unnamed>")
        );
        self.deliver(STARTUP_NOTICE, MessageFormat::Plain).await?;
        info!("Startup notice sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_payload_uses_html_parse_mode() {
        let payload = send_message_payload("-100123", "<b>hi</b>", MessageFormat::Rich);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chat_id"], "-100123");
        assert_eq!(json["parse_mode"], "HTML");
    }

    #[test]
    fn plain_payload_omits_parse_mode() {
        let payload = send_message_payload("-100123", "hi", MessageFormat::Plain);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("parse_mode").is_none());
    }

    #[test]
    fn rejected_response_carries_description() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        match parse_response::<serde_json::Value>(body) {
            Err(DeliveryError::Rejected(msg)) => assert_eq!(msg, "Bad Request: chat not found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn get_me_response_parses() {
        let body = r#"{"ok":true,"result":{"id":1,"is_bot":true,"username":"price_watch_bot"}}"#;
        let user = parse_response::<BotUser>(body).unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("price_watch_bot"));
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(matches!(
            parse_response::<serde_json::Value>("Bad Gateway"),
            Err(DeliveryError::Json(_))
        ));
    }

    #[test]
    fn method_url_embeds_token() {
        let creds = TelegramCredentials::from_parts(Some("123:abc".into()), Some("42".into())).unwrap();
        let notifier = TelegramNotifier::new(creds, Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:9");
        assert_eq!(notifier.method_url("getMe"), "http://localhost:9/bot123:abc/getMe");
    }
}
