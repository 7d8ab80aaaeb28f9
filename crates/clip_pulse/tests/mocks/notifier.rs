use std::sync::{Arc, Mutex};

use clip_pulse::Notifier;

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<(i64, String)>>>,
    pub fail_for_chat: Option<i64>,
}

impl MockNotifier {
    /// Deliveries to this chat id fail; all others succeed.
    pub fn failing_for(chat_id: i64) -> Self {
        Self {
            fail_for_chat: Some(chat_id),
            ..Default::default()
        }
    }
}

impl Notifier for MockNotifier {
    type Error = anyhow::Error;

    async fn notify(&self, chat_id: i64, text: &str, _disable_preview: bool) -> anyhow::Result<()> {
        if self.fail_for_chat == Some(chat_id) {
            return Err(anyhow::anyhow!("delivery failed for chat {}", chat_id));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
