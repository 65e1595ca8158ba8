//! Orchestration of the conversation and wallet sub-machines.
//!
//! Two independent busy axes run over the same session: the wallet fetch
//! (fire-and-forget on startup) and the chat submission (single-flight,
//! gating further input). They touch disjoint busy flags but share the
//! wallet store, so a startup fetch racing a chat reply is possible; the
//! later-completing call's wallet write wins (last-write-wins by completion
//! order, not request order), deliberately without any extra ordering.

use std::sync::Arc;

use crate::gateway::{WalletAgentApi, WalletRecord};
use crate::state::{ConversationStore, Message, WalletStore};

/// Fixed assistant line injected into the transcript when a send fails.
pub const ERROR_REPLY: &str =
    "Sorry, something went wrong while talking to the wallet agent. Please try again.";

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Guarded off: a reply was already in flight or the input was blank.
    /// The conversation store is untouched.
    Ignored,
    /// An assistant entry was appended: the agent's reply, or the fixed
    /// error line when the gateway failed.
    Replied { content: String, failed: bool },
}

/// Wires the session id, gateway, and the two state stores together.
pub struct Orchestrator {
    gateway: Arc<dyn WalletAgentApi>,
    conversation: ConversationStore,
    wallet: WalletStore,
    session_id: String,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn WalletAgentApi>,
        conversation: ConversationStore,
        wallet: WalletStore,
        session_id: String,
    ) -> Self {
        Self {
            gateway,
            conversation,
            wallet,
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn wallet(&self) -> &WalletStore {
        &self.wallet
    }

    /// Fetch the backend's wallet for this session and cache it.
    ///
    /// Startup must never block on wallet availability: a fetch failure is
    /// logged and swallowed, leaving the cached record unchanged (silently
    /// degrading to "no known wallet"). A successful empty fetch clears the
    /// cache; a successful non-empty fetch replaces it.
    pub async fn refresh_wallet(&self) {
        let _busy = self.wallet.busy_guard();

        match self.gateway.fetch_wallet(&self.session_id).await {
            Ok(Some(record)) => {
                tracing::debug!(address = %record.address, "wallet fetch returned active wallet");
                self.wallet.set_wallet(Some(record));
            }
            Ok(None) => {
                tracing::debug!("wallet fetch returned no active wallet");
                self.wallet.set_wallet(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet fetch failed, keeping cached state");
            }
        }
    }

    /// Submit one user turn.
    ///
    /// No-op while a reply is in flight or when the input is blank. Otherwise
    /// the user message is appended immediately (optimistic, unconditional)
    /// and the busy flag stays raised until the gateway call resolves either
    /// way; the release rides a drop guard so it survives every exit path.
    /// Failures surface as a fixed assistant line in the transcript, never as
    /// an error the caller must handle separately. No automatic retry.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if self.conversation.is_busy() {
            tracing::debug!("submission ignored: a reply is already in flight");
            return SubmitOutcome::Ignored;
        }
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.conversation.append(Message::user(text));
        let _busy = self.conversation.busy_guard();

        match self.gateway.send_message(&self.session_id, text).await {
            Ok(reply) => {
                self.conversation
                    .append(Message::assistant(reply.response.clone()));
                if let Some(record) = reply.wallet {
                    self.reconcile_wallet(record);
                }
                SubmitOutcome::Replied {
                    content: reply.response,
                    failed: false,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "chat send failed");
                self.conversation.append(Message::assistant(ERROR_REPLY));
                SubmitOutcome::Replied {
                    content: ERROR_REPLY.to_string(),
                    failed: true,
                }
            }
        }
    }

    /// Overwrite the cached wallet when the backend pushes one with a new
    /// address (or when nothing is cached). This is the sole path by which
    /// wallet state changes after startup. A pushed record with the same
    /// address is ignored, network label included.
    fn reconcile_wallet(&self, pushed: WalletRecord) {
        if self.wallet.address().as_deref() != Some(pushed.address.as_str()) {
            tracing::info!(address = %pushed.address, network = %pushed.network, "active wallet changed");
            self.wallet.set_wallet(Some(pushed));
        }
    }
}
