//! Inbound Messenger event model, one variant per event kind the listener
//! forwards to the bridge.

/// Raw attachment payload as the client reports it.
#[derive(Clone, Debug, PartialEq)]
pub enum MsgrAttachment {
    Sticker {
        id: String,
        url: String,
    },
    AnimatedImage {
        id: String,
        url: String,
    },
    Photo {
        id: String,
        url: String,
    },
    File {
        url: String,
        file_name: String,
    },
    Video {
        url: String,
        file_name: String,
    },
    Audio {
        url: String,
        file_name: String,
    },
    /// A shared link card; becomes addition text, never a download.
    Share {
        url: String,
        title: String,
        description: String,
        source: String,
    },
}

/// The quoted message carried by a reply event.
#[derive(Clone, Debug, PartialEq)]
pub struct MsgrQuote {
    pub sender_id: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MsgrMessage {
    pub thread_id: i64,
    pub sender_id: String,
    pub body: String,
    pub attachments: Vec<MsgrAttachment>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessengerEvent {
    Message(MsgrMessage),
    Reply { message: MsgrMessage, quote: MsgrQuote },
}
