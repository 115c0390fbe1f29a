//! Long-polling dispatcher for the Telegram → Messenger direction.

use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{debug, warn};

use tmb_core::attach::AttachmentPipeline;
use tmb_core::compose::{compose, Composed, Labels, MarkupDialect};
use tmb_core::outbound::{MessengerDelivery, MessengerOutbound, MessengerPort};
use tmb_core::routing::RoutingTable;
use tmb_core::Result;

use crate::event::TgMessage;
use crate::extract::TgExtractor;

#[derive(Clone)]
pub struct TgRelayState {
    pub routes: Arc<RoutingTable>,
    pub extractor: Arc<TgExtractor>,
    pub pipeline: Arc<AttachmentPipeline>,
    pub messenger: Arc<dyn MessengerPort>,
    pub labels: Arc<Labels>,
    pub dialect: MarkupDialect,
}

/// Run the update dispatcher until shutdown. New and edited messages go
/// through the same relay path; the edited flag is the only difference.
pub async fn run_polling(bot: Bot, state: TgRelayState) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_edited_message().endpoint(on_edited));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;
}

async fn on_message(msg: Message, state: TgRelayState) -> ResponseResult<()> {
    spawn_relay(&msg, false, state);
    Ok(())
}

async fn on_edited(msg: Message, state: TgRelayState) -> ResponseResult<()> {
    spawn_relay(&msg, true, state);
    Ok(())
}

/// Each update is relayed on its own task so a slow download never blocks
/// the poll loop. Failures are logged and dropped, never retried.
fn spawn_relay(msg: &Message, is_edited: bool, state: TgRelayState) {
    let snapshot = TgMessage::from_teloxide(msg, is_edited);
    tokio::spawn(async move {
        if let Err(e) = relay(snapshot, state).await {
            warn!("telegram relay failed: {e}");
        }
    });
}

async fn relay(msg: TgMessage, state: TgRelayState) -> Result<()> {
    let Some(thread_id) = state.routes.thread_for(msg.chat_id) else {
        debug!("ignoring message from unrouted chat {}", msg.chat_id);
        return Ok(());
    };

    let mut normalized = state.extractor.extract(&msg)?;

    // A failed download degrades the message to text-only rather than
    // losing it.
    let mut attachment = None;
    if let Some(desc) = normalized.attachment.take() {
        match state.pipeline.resolve(desc).await {
            Ok(resolved) => attachment = Some(resolved),
            Err(e) => warn!("attachment dropped, relaying text only: {e}"),
        }
    }

    match compose(&normalized, state.dialect, &state.labels) {
        Composed::Text(text) => {
            state
                .messenger
                .deliver(MessengerDelivery {
                    thread_id,
                    payload: MessengerOutbound::Message { text, attachment },
                })
                .await
        }
        Composed::Poll { title, options } => {
            if let Some(media) = attachment {
                media.cleanup();
            }
            state
                .messenger
                .deliver(MessengerDelivery {
                    thread_id,
                    payload: MessengerOutbound::Poll { title, options },
                })
                .await
        }
    }
}
