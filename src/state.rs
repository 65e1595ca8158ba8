//! Client-side session state: the conversation log and the cached wallet.
//!
//! Both stores are dumb containers with no business rules; the orchestrator
//! decides what goes in and when. They are cheaply cloneable handles over
//! shared interiors so the fire-and-forget wallet fetch and an in-flight
//! chat submission can touch them concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::gateway::WalletRecord;

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// RAII busy-flag holder: raises the flag on construction and guarantees
/// release on every exit path, including panics and early returns.
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn raise(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Ordered, append-only conversation log plus an "awaiting chat reply" flag.
///
/// Insertion order is conversation order; no operation reorders or
/// deduplicates entries. Duplicate identical messages are legal.
#[derive(Clone, Default)]
pub struct ConversationStore {
    messages: Arc<RwLock<Vec<Message>>>,
    busy: Arc<AtomicBool>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message, preserving order.
    pub fn append(&self, message: Message) {
        self.messages
            .write()
            .expect("conversation lock poisoned")
            .push(message);
    }

    /// Snapshot of the log in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .read()
            .expect("conversation lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .read()
            .expect("conversation lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Raise the busy flag until the returned guard drops.
    pub fn busy_guard(&self) -> BusyGuard {
        BusyGuard::raise(Arc::clone(&self.busy))
    }

    /// Empty the log. Chat history and wallet identity are independent
    /// lifecycles: this touches neither the busy flag nor any wallet state.
    pub fn clear(&self) {
        self.messages
            .write()
            .expect("conversation lock poisoned")
            .clear();
    }
}

/// What the wallet surface should show. Exactly one state applies, fully
/// determined by `(Option<WalletRecord>, busy)`.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletView {
    /// A fetch is in flight and nothing is cached yet.
    Loading,
    /// No active wallet is known for this session.
    None,
    /// The cached record (shown as-is during background refreshes).
    Active(WalletRecord),
}

/// Last-known active wallet plus an "awaiting wallet fetch" flag.
///
/// Replacement is whole-record: a new `WalletRecord` fully replaces the
/// previous one, never a merge of fields.
#[derive(Clone, Default)]
pub struct WalletStore {
    wallet: Arc<RwLock<Option<WalletRecord>>>,
    busy: Arc<AtomicBool>,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached record wholesale (or drop it with `None`).
    pub fn set_wallet(&self, record: Option<WalletRecord>) {
        *self.wallet.write().expect("wallet lock poisoned") = record;
    }

    pub fn wallet(&self) -> Option<WalletRecord> {
        self.wallet.read().expect("wallet lock poisoned").clone()
    }

    /// Cached address, the key the orchestrator reconciles against.
    pub fn address(&self) -> Option<String> {
        self.wallet
            .read()
            .expect("wallet lock poisoned")
            .as_ref()
            .map(|w| w.address.clone())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Raise the busy flag until the returned guard drops.
    pub fn busy_guard(&self) -> BusyGuard {
        BusyGuard::raise(Arc::clone(&self.busy))
    }

    /// Drop the cached record and lower the busy flag.
    pub fn clear(&self) {
        self.set_wallet(None);
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Resolve the single wallet display state.
    pub fn view(&self) -> WalletView {
        match (self.wallet(), self.is_busy()) {
            (Some(record), _) => WalletView::Active(record),
            (None, true) => WalletView::Loading,
            (None, false) => WalletView::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(address: &str) -> WalletRecord {
        WalletRecord {
            address: address.to_string(),
            network: "base-sepolia".to_string(),
            wallet_id: None,
            assets: Vec::new(),
        }
    }

    #[test]
    fn append_preserves_order_and_duplicates() {
        let store = ConversationStore::new();
        store.append(Message::user("hi"));
        store.append(Message::assistant("hello"));
        store.append(Message::user("hi"));

        let log = store.messages();
        assert_eq!(
            log,
            vec![
                Message::user("hi"),
                Message::assistant("hello"),
                Message::user("hi"),
            ]
        );
    }

    #[test]
    fn clear_empties_log_but_leaves_busy_flag() {
        let store = ConversationStore::new();
        store.append(Message::user("hi"));
        let _guard = store.busy_guard();

        store.clear();

        assert!(store.is_empty());
        assert!(store.is_busy());
    }

    #[test]
    fn busy_guard_releases_on_drop() {
        let store = ConversationStore::new();
        {
            let _guard = store.busy_guard();
            assert!(store.is_busy());
        }
        assert!(!store.is_busy());
    }

    #[test]
    fn busy_guard_releases_on_panic() {
        let store = ConversationStore::new();
        let inner = store.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = inner.busy_guard();
            panic!("append blew up");
        }));
        assert!(result.is_err());
        assert!(!store.is_busy());
    }

    #[test]
    fn wallet_replacement_is_whole_record() {
        let store = WalletStore::new();
        store.set_wallet(Some(record("0xaaaa")));
        store.set_wallet(Some(record("0xbbbb")));

        assert_eq!(store.address().as_deref(), Some("0xbbbb"));
    }

    #[test]
    fn wallet_clear_resets_record_and_busy() {
        let store = WalletStore::new();
        store.set_wallet(Some(record("0xaaaa")));
        let guard = store.busy_guard();
        std::mem::forget(guard);

        store.clear();

        assert_eq!(store.wallet(), None);
        assert!(!store.is_busy());
    }

    #[test]
    fn wallet_view_states_are_mutually_exclusive() {
        let store = WalletStore::new();
        assert_eq!(store.view(), WalletView::None);

        let guard = store.busy_guard();
        assert_eq!(store.view(), WalletView::Loading);
        drop(guard);

        store.set_wallet(Some(record("0xaaaa")));
        assert_eq!(store.view(), WalletView::Active(record("0xaaaa")));

        // A background refresh with a cached record keeps showing the record.
        let _guard = store.busy_guard();
        assert_eq!(store.view(), WalletView::Active(record("0xaaaa")));
    }
}
