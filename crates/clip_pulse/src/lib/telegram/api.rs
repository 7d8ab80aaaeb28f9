use serde::Deserialize;

use crate::telegram::Notifier;

/// Minimal Telegram Bot API client: the three methods the bot needs.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: "https://api.telegram.org".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, TelegramError> {
        let resp = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, method, "Failed to make http request"))?;

        let envelope = resp.json::<ApiResponse<T>>().await?;
        if !envelope.ok {
            return Err(TelegramError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            ));
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::Api("missing result payload".into()))
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        disable_preview: bool,
    ) -> Result<Message, TelegramError> {
        self.call(
            "sendMessage",
            serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "disable_web_page_preview": disable_preview,
            }),
        )
        .await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        // The edited message comes back in full; only the ack matters here
        self.call::<serde_json::Value>(
            "editMessageText",
            serde_json::json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "text": text,
            }),
        )
        .await
        .map(|_| ())
    }

    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Notifier for TelegramClient {
    type Error = TelegramError;

    async fn notify(
        &self,
        chat_id: i64,
        text: &str,
        disable_preview: bool,
    ) -> Result<(), TelegramError> {
        self.send_message(chat_id, text, disable_preview)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserializes() {
        let json = r#"{
            "update_id": 873421,
            "message": {
                "message_id": 17,
                "from": {"id": 42, "is_bot": false, "first_name": "Anh", "username": "anh_vn"},
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "text": "/subscribe https://www.youtube.com/channel/UCabc"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 873421);
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.unwrap().username.as_deref(), Some("anh_vn"));
        assert!(message.text.unwrap().starts_with("/subscribe"));
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let envelope: ApiResponse<Message> = serde_json::from_str(json).unwrap();
        assert!(!envelope.ok);
        assert_eq!(
            envelope.description.as_deref(),
            Some("Bad Request: chat not found")
        );
        assert!(envelope.result.is_none());
    }

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new("123:abc").with_base_url("http://localhost:8081");
        assert_eq!(
            client.method_url("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }
}
