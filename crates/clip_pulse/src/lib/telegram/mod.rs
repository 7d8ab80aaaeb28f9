pub mod api;

use std::{fmt::Debug, future::Future};

pub use api::{TelegramClient, TelegramError};

/// Delivery seam for outbound notifications. The poll processor fans out
/// through this; tests substitute it.
pub trait Notifier {
    type Error: Debug;

    fn notify(
        &self,
        chat_id: i64,
        text: &str,
        disable_preview: bool,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
