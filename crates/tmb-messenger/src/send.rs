//! Outbound `MessengerPort` over the wrapped client.

use std::sync::Arc;

use async_trait::async_trait;

use tmb_core::outbound::{MessengerDelivery, MessengerOutbound, MessengerPort};
use tmb_core::Result;

use crate::api::{MessengerApi, OutgoingMessage};

pub struct MessengerSender {
    api: Arc<dyn MessengerApi>,
}

impl MessengerSender {
    pub fn new(api: Arc<dyn MessengerApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MessengerPort for MessengerSender {
    async fn deliver(&self, delivery: MessengerDelivery) -> Result<()> {
        match delivery.payload {
            MessengerOutbound::Message { text, attachment } => {
                let result = self
                    .api
                    .send(
                        delivery.thread_id,
                        OutgoingMessage {
                            body: &text,
                            attachment: attachment.as_ref(),
                        },
                    )
                    .await;
                // Temp files go away after the send settles, even on failure.
                if let Some(media) = attachment {
                    media.cleanup();
                }
                result
            }
            MessengerOutbound::Poll { title, options } => {
                self.api
                    .create_poll(delivery.thread_id, &title, &options)
                    .await
            }
        }
    }
}
