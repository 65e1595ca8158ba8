//! walletchat: terminal chat client for a wallet-management agent.
//!
//! The client converses with a remote agent over HTTP and locally tracks two
//! pieces of session state: the running conversation and the last-known
//! active wallet. A durable anonymous session id correlates all requests
//! from one profile with one backend-side conversational/wallet context.

pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod orchestrator;
pub mod repl;
pub mod session;
pub mod state;

pub use error::{Error, Result};
pub use gateway::{HttpGateway, WalletAgentApi, WalletRecord};
pub use orchestrator::{ERROR_REPLY, Orchestrator, SubmitOutcome};
pub use session::SessionIdentity;
pub use state::{ConversationStore, Message, Role, WalletStore, WalletView};
