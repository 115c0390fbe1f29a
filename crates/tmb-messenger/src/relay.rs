//! Relay loop for the Messenger → Telegram direction.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use tmb_core::attach::{AttachmentKind, AttachmentPipeline};
use tmb_core::compose::{compose, Composed, Labels, MarkupDialect};
use tmb_core::identity::pick_name;
use tmb_core::outbound::{TelegramDelivery, TelegramOutbound, TelegramPort};
use tmb_core::routing::RoutingTable;
use tmb_core::Result;

use crate::api::MessengerApi;
use crate::event::{MessengerEvent, MsgrMessage, MsgrQuote};
use crate::extract::MsgrExtractor;

#[derive(Clone)]
pub struct MsgrRelayState {
    pub routes: Arc<RoutingTable>,
    pub api: Arc<dyn MessengerApi>,
    pub extractor: Arc<MsgrExtractor>,
    pub pipeline: Arc<AttachmentPipeline>,
    pub telegram: Arc<dyn TelegramPort>,
    pub labels: Arc<Labels>,
    pub dialect: MarkupDialect,
}

/// Consume listener events until the channel closes. Each event gets its
/// own task so a stalled download never blocks the ones behind it.
pub async fn run(mut events: mpsc::Receiver<MessengerEvent>, state: MsgrRelayState) {
    while let Some(event) = events.recv().await {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle(event, state).await {
                warn!("messenger relay failed: {e}");
            }
        });
    }
    debug!("messenger event channel closed");
}

async fn handle(event: MessengerEvent, state: MsgrRelayState) -> Result<()> {
    let (msg, quote) = match event {
        MessengerEvent::Message(msg) => (msg, None),
        MessengerEvent::Reply { message, quote } => (message, Some(quote)),
    };

    if msg.sender_id == state.api.self_id() {
        return Ok(());
    }
    let Some(chat_id) = state.routes.chat_for(msg.thread_id) else {
        debug!("ignoring message from unrouted thread {}", msg.thread_id);
        return Ok(());
    };

    let mut normalized = normalize(&msg, quote.as_ref(), &state).await;

    let mut attachment = None;
    if let Some(desc) = normalized.attachment.take() {
        match state.pipeline.resolve(desc).await {
            Ok(resolved) => attachment = Some(resolved),
            Err(e) => warn!("attachment dropped, relaying text only: {e}"),
        }
    }

    let text = match compose(&normalized, state.dialect, &state.labels) {
        Composed::Text(text) => text,
        // Messenger events never carry polls.
        Composed::Poll { title, .. } => title,
    };

    let payload = match attachment {
        None => TelegramOutbound::Text(text),
        Some(media) => match media.kind {
            AttachmentKind::Photo => TelegramOutbound::Photo { caption: text, media },
            AttachmentKind::Video => TelegramOutbound::Video { caption: text, media },
            AttachmentKind::Audio => TelegramOutbound::Audio { caption: text, media },
            AttachmentKind::Voice => TelegramOutbound::Voice { caption: text, media },
            AttachmentKind::VideoNote => TelegramOutbound::VideoNote { caption: text, media },
            AttachmentKind::Gif => TelegramOutbound::Animation { caption: text, media },
            AttachmentKind::Document
            | AttachmentKind::StickerStatic
            | AttachmentKind::StickerAnimated => TelegramOutbound::Document { caption: text, media },
        },
    };

    state
        .telegram
        .deliver(TelegramDelivery { chat_id, payload })
        .await
}

/// Resolve display names through the live client, then run the pure
/// extractor. Lookup failures degrade to id-based names.
async fn normalize(
    msg: &MsgrMessage,
    quote: Option<&MsgrQuote>,
    state: &MsgrRelayState,
) -> tmb_core::message::NormalizedMessage {
    let nicknames = match state.api.thread_nicknames(msg.thread_id).await {
        Ok(map) => map,
        Err(e) => {
            warn!("thread nickname lookup failed: {e}");
            Default::default()
        }
    };

    let sender_profile = profile_name(state, &msg.sender_id).await;
    let sender_name = pick_name(
        nicknames.get(&msg.sender_id).map(String::as_str),
        sender_profile.as_deref(),
        &msg.sender_id,
    );

    let quoted_name = match quote {
        Some(q) if q.sender_id != state.api.self_id() => {
            let profile = profile_name(state, &q.sender_id).await;
            Some(pick_name(
                nicknames.get(&q.sender_id).map(String::as_str),
                profile.as_deref(),
                &q.sender_id,
            ))
        }
        _ => None,
    };

    state.extractor.extract(
        msg,
        quote,
        sender_name,
        quoted_name,
        state.api.self_id(),
    )
}

async fn profile_name(state: &MsgrRelayState, user_id: &str) -> Option<String> {
    match state.api.user_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!("profile name lookup failed for {user_id}: {e}");
            None
        }
    }
}
