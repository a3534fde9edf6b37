//! Progress sink that renders transfer events into chat messages.

use std::sync::Arc;

use async_trait::async_trait;

use gtb_core::{
    domain::ChatId,
    events::{ProgressSink, TransferEvent},
    ports::Notifier,
    Result,
};

/// Delivers every pipeline milestone as a text message to one chat,
/// typically the chat the transfer was started from.
pub struct ChatProgressSink {
    notifier: Arc<dyn Notifier>,
    chat: ChatId,
}

impl ChatProgressSink {
    pub fn new(notifier: Arc<dyn Notifier>, chat: ChatId) -> Self {
        Self { notifier, chat }
    }
}

#[async_trait]
impl ProgressSink for ChatProgressSink {
    async fn notify(&self, event: TransferEvent) -> Result<()> {
        self.notifier.send_text(self.chat, &render(&event)).await
    }
}

pub(crate) fn render(event: &TransferEvent) -> String {
    match event {
        TransferEvent::Started { source, target, .. } => format!(
            "🔍 **Fetching members from source group...**\n\nFrom: `{source}`\nTo: `{target}`"
        ),
        TransferEvent::Found { total: 0 } => {
            "❌ **No members found in source group.**".to_string()
        }
        TransferEvent::Found { total } => {
            format!("📊 **Found {total} members**\n\n🚀 Starting transfer process...")
        }
        TransferEvent::Progress {
            transferred,
            failed,
            position,
            total,
        } => format!(
            "📊 **Progress Update**\n\n\
             ✅ Transferred: {transferred}\n\
             ❌ Failed: {failed}\n\
             📈 Progress: {position}/{total}"
        ),
        TransferEvent::Completed {
            transferred,
            failed,
            total,
            finished_at,
        } => format!(
            "🎉 **Transfer Complete!**\n\n\
             📊 **Final Statistics:**\n\
             ✅ Successfully transferred: {transferred}\n\
             ❌ Failed transfers: {failed}\n\
             📈 Total processed: {total}\n\
             ⏰ Completed at: {}\n\n\
             ⚠️ **Note:** Failed transfers may be due to user privacy settings or admin restrictions.",
            finished_at.format("%Y-%m-%d %H:%M:%S")
        ),
        TransferEvent::Failed { reason } => format!(
            "❌ **Transfer Failed**\n\n\
             **Error:** {reason}\n\n\
             Please check the chat IDs and try again."
        ),
    }
}
