//! Interactive REPL surface with line editing and markdown rendering.
//!
//! Uses rustyline for line editing, history, and slash-command completion,
//! and termimad for rendering agent replies inline. The transcript renders
//! top-to-bottom in arrival order; the wallet surface is a single status
//! line showing exactly one of loading / no wallet / the cached record.
//!
//! ## Commands
//!
//! - `/help` - Show available commands
//! - `/quit` or `/exit` - Exit the REPL
//! - `/wallet` - Show the cached active wallet
//! - `/session` - Show the session id
//! - `/clear` - Clear the conversation log
//! - `/forget-session` - Drop the stored session id

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use rustyline::completion::Completer;
use rustyline::config::Config as LineConfig;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Editor, Helper};
use termimad::MadSkin;

use crate::config::walletchat_dir;
use crate::error::ChannelError;
use crate::format::{format_onchain_refs, shorten_address};
use crate::orchestrator::{Orchestrator, SubmitOutcome};
use crate::session::{FileSessionStore, SessionIdentity};
use crate::state::WalletView;

/// Slash commands available in the REPL.
const SLASH_COMMANDS: &[&str] = &[
    "/help",
    "/quit",
    "/exit",
    "/wallet",
    "/session",
    "/clear",
    "/forget-session",
];

/// Rustyline helper for slash-command tab completion.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let prefix = &line[..pos];
        let matches: Vec<String> = SLASH_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| cmd.to_string())
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }

        SLASH_COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ReplHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

impl Validator for ReplHelper {}
impl Helper for ReplHelper {}

/// Build a termimad skin with our color scheme.
fn make_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(termimad::crossterm::style::Color::Yellow);
    skin.bold.set_fg(termimad::crossterm::style::Color::White);
    skin.inline_code
        .set_fg(termimad::crossterm::style::Color::Green);
    skin.code_block
        .set_fg(termimad::crossterm::style::Color::Green);
    skin
}

/// Get the history file path (~/.walletchat/history).
fn history_path() -> PathBuf {
    walletchat_dir().join("history")
}

/// One-line wallet status for the prompt surface. The three states are
/// mutually exclusive and fully determined by the store's view.
fn wallet_status_line(view: &WalletView) -> String {
    match view {
        WalletView::Loading => "wallet: loading...".to_string(),
        WalletView::None => "wallet: none set".to_string(),
        WalletView::Active(record) => format!(
            "wallet: {} ({})",
            shorten_address(&record.address),
            record.network
        ),
    }
}

fn print_help() {
    let h = "\x1b[1m"; // bold (section headers)
    let c = "\x1b[1;36m"; // bold cyan (commands)
    let d = "\x1b[90m"; // dim gray (descriptions)
    let r = "\x1b[0m"; // reset

    println!();
    println!("  {h}walletchat REPL{r}");
    println!();
    println!("  {h}Commands{r}");
    println!("  {c}/help{r}             {d}show this help{r}");
    println!("  {c}/wallet{r}           {d}show the active wallet{r}");
    println!("  {c}/session{r}          {d}show the session id{r}");
    println!("  {c}/clear{r}            {d}clear the conversation{r}");
    println!("  {c}/forget-session{r}   {d}drop the stored session id{r}");
    println!("  {c}/quit{r} {c}/exit{r}       {d}exit the repl{r}");
    println!();
    println!("  {h}Try{r}");
    println!("  {d}create a new wallet{r}");
    println!("  {d}fund my wallet with ETH{r}");
    println!("  {d}send 0.5 USDC to 0x...{r}");
    println!();
}

/// Terminal chat surface over the orchestrator.
pub struct Repl {
    orchestrator: Arc<Orchestrator>,
    identity: SessionIdentity<FileSessionStore>,
    explorer_tx_base: String,
    /// Optional single message to send (for the -m flag).
    single_message: Option<String>,
}

impl Repl {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        identity: SessionIdentity<FileSessionStore>,
        explorer_tx_base: String,
    ) -> Self {
        Self {
            orchestrator,
            identity,
            explorer_tx_base,
            single_message: None,
        }
    }

    /// REPL that sends a single message and exits.
    pub fn with_message(mut self, message: String) -> Self {
        self.single_message = Some(message);
        self
    }

    /// Run the surface until the user quits (or the one-shot message is
    /// answered). The startup wallet fetch is fired here and left to land
    /// whenever it lands.
    pub async fn run(self) -> Result<(), ChannelError> {
        let startup = Arc::clone(&self.orchestrator);
        let wallet_fetch = tokio::spawn(async move { startup.refresh_wallet().await });

        if let Some(message) = self.single_message.clone() {
            self.send_and_render(&message).await;
            // Let the startup fetch land so the closing status line is fresh.
            let _ = wallet_fetch.await;
            eprintln!("\x1b[90m{}\x1b[0m", self.status_line());
            return Ok(());
        }

        let config = LineConfig::builder()
            .history_ignore_dups(true)
            .map_err(|e| ChannelError::EditorInit(e.to_string()))?
            .auto_add_history(true)
            .completion_type(CompletionType::List)
            .build();

        let mut rl = Editor::with_config(config)
            .map_err(|e| ChannelError::EditorInit(e.to_string()))?;
        rl.set_helper(Some(ReplHelper));

        let hist_path = history_path();
        if let Some(parent) = hist_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(&hist_path);

        println!("\x1b[1mwalletchat\x1b[0m  /help for commands, /quit to exit");
        println!();

        loop {
            let line = tokio::task::block_in_place(|| rl.readline("\x1b[1;36m\u{203A}\x1b[0m "));
            match line {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with('/') {
                        if self.handle_command(&line) {
                            break;
                        }
                        continue;
                    }
                    self.send_and_render(&line).await;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    return Err(ChannelError::Input(e.to_string()));
                }
            }
        }

        let _ = rl.save_history(&history_path());
        wallet_fetch.abort();
        Ok(())
    }

    /// Handle a slash command locally. Returns true when the REPL should exit.
    fn handle_command(&self, line: &str) -> bool {
        match line.to_lowercase().as_str() {
            "/quit" | "/exit" => return true,
            "/help" => print_help(),
            "/session" => {
                println!("\x1b[90msession: {}\x1b[0m", self.orchestrator.session_id());
            }
            "/wallet" => self.print_wallet(),
            "/clear" => {
                self.orchestrator.conversation().clear();
                println!("\x1b[90mconversation cleared\x1b[0m");
            }
            "/forget-session" => match self.identity.clear() {
                Ok(()) => println!(
                    "\x1b[90msession id dropped; a fresh session starts on next launch\x1b[0m"
                ),
                Err(e) => eprintln!("\x1b[31mfailed to drop session: {e}\x1b[0m"),
            },
            other => {
                println!("\x1b[90munknown command {other}, see /help\x1b[0m");
            }
        }
        false
    }

    fn print_wallet(&self) {
        match self.orchestrator.wallet().view() {
            WalletView::Loading => println!("\x1b[90mwallet: loading...\x1b[0m"),
            WalletView::None => {
                println!("\x1b[90mno wallet set; try 'create a new wallet'\x1b[0m");
            }
            WalletView::Active(record) => {
                println!("  \x1b[1maddress\x1b[0m  {}", record.address);
                println!("  \x1b[1mnetwork\x1b[0m  {}", record.network);
                for asset in &record.assets {
                    println!(
                        "  \x1b[1m{:>7}\x1b[0m  {}",
                        asset.symbol.to_lowercase(),
                        asset.balance
                    );
                }
            }
        }
    }

    fn status_line(&self) -> String {
        wallet_status_line(&self.orchestrator.wallet().view())
    }

    /// Submit one turn and render whatever ends up in the transcript.
    async fn send_and_render(&self, text: &str) {
        eprintln!("  \x1b[90m\u{25CB} thinking...\x1b[0m");

        match self.orchestrator.submit(text).await {
            SubmitOutcome::Ignored => {
                eprintln!("  \x1b[90m(ignored: a reply is already in flight)\x1b[0m");
            }
            SubmitOutcome::Replied { content, failed } => {
                let width = crossterm::terminal::size()
                    .map(|(w, _)| w as usize)
                    .unwrap_or(80);
                let sep_width = width.min(80);
                eprintln!("\x1b[90m{}\x1b[0m", "\u{2500}".repeat(sep_width));

                let rendered = format_onchain_refs(&content, &self.explorer_tx_base);
                let skin = make_skin();
                let text = termimad::FmtText::from(&skin, &rendered, Some(width));
                print!("{text}");
                println!();

                if !failed {
                    eprintln!("\x1b[90m{}\x1b[0m", self.status_line());
                }
            }
        }
    }
}
