//! Boundary trait for the wrapped Messenger client.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use tmb_core::attach::ResolvedAttachment;
use tmb_core::errors::Error;
use tmb_core::Result;

/// One outbound Messenger message, borrowed from the delivery that owns it.
pub struct OutgoingMessage<'a> {
    pub body: &'a str,
    pub attachment: Option<&'a ResolvedAttachment>,
}

/// The Messenger client surface the bridge depends on. The session-backed
/// implementation lives outside this crate; tests and a not-yet-linked
/// deployment use the stand-ins below.
#[async_trait]
pub trait MessengerApi: Send + Sync {
    /// The logged-in account's own user id, for self-echo suppression.
    fn self_id(&self) -> &str;

    async fn send(&self, thread_id: i64, message: OutgoingMessage<'_>) -> Result<()>;

    /// Create a thread poll. Options carry their vote counts so a relayed
    /// poll starts from the source tally.
    async fn create_poll(
        &self,
        thread_id: i64,
        title: &str,
        options: &[(String, u32)],
    ) -> Result<()>;

    /// Per-thread nickname table, keyed by user id.
    async fn thread_nicknames(&self, thread_id: i64) -> Result<HashMap<String, String>>;

    /// Profile display name for a user id, when the platform knows one.
    async fn user_name(&self, user_id: &str) -> Result<Option<String>>;
}

/// Placeholder used while no real client is wired in. Sends fail as a
/// transport error; lookups succeed empty so extraction still works.
pub struct UnlinkedApi;

#[async_trait]
impl MessengerApi for UnlinkedApi {
    fn self_id(&self) -> &str {
        "0"
    }

    async fn send(&self, thread_id: i64, _message: OutgoingMessage<'_>) -> Result<()> {
        debug!("unlinked messenger client, send to thread {thread_id} refused");
        Err(Error::Transport("messenger client not linked".into()))
    }

    async fn create_poll(
        &self,
        thread_id: i64,
        _title: &str,
        _options: &[(String, u32)],
    ) -> Result<()> {
        debug!("unlinked messenger client, poll for thread {thread_id} refused");
        Err(Error::Transport("messenger client not linked".into()))
    }

    async fn thread_nicknames(&self, _thread_id: i64) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    async fn user_name(&self, _user_id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
