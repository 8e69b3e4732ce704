use crate::{
    admin::{
        AdminSet,
        AdminSetError,
    },
    ledger::{
        AccountId,
        LedgerError,
    },
    store::SnapshotStore,
    telegram::TelegramTransport,
    transport::{
        ChatId,
        Transport,
    },
    wager::WagerFlowController,
};
use color_eyre::eyre::Result;
use std::{
    sync::Arc,
    time::Duration,
};
use tracing::{
    info,
    warn,
};

const POLL_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

const HELP_TEXT: &str = "🎲 Hi-lo dice bot\n\
    /bet [high/low] [amount] — wager on the next three dice\n\
    /balance — show your balance\n\
    /history — show the recent outcome streak\n\
    /credit [user_id] [amount] — top up an account (admins)\n\
    /deposit [amount] — top up yourself (admins)\n\
    /admin list|add|remove [id] — manage admins";

/// One inbound command, split into its raw pieces. Argument validation
/// stays with the operation that consumes it.
#[derive(Debug, Eq, PartialEq)]
pub enum Command {
    Help,
    Balance,
    Credit { target: String, amount: String },
    Deposit { amount: String },
    Bet { side: String, amount: String },
    History,
    AdminList,
    AdminAdd { target: String },
    AdminRemove { target: String },
    Usage(&'static str),
    Unknown,
}

/// Parses a message into a command. Returns None for plain chatter so
/// the bot stays silent in group conversations.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let mut parts = trimmed.split_whitespace();
    let command = parts.next()?;
    // Group chats address commands as /bet@BotName.
    let command = command.split('@').next().unwrap_or(command);
    let args: Vec<&str> = parts.collect();
    let parsed = match (command, args.as_slice()) {
        ("/start" | "/help", _) => Command::Help,
        ("/balance", _) => Command::Balance,
        ("/credit", [target, amount]) => Command::Credit {
            target: (*target).to_string(),
            amount: (*amount).to_string(),
        },
        ("/credit", _) => Command::Usage("⚠️ Usage: /credit [user_id] [amount]"),
        ("/deposit", [amount]) => Command::Deposit {
            amount: (*amount).to_string(),
        },
        ("/deposit", _) => Command::Usage("⚠️ Usage: /deposit [amount]"),
        ("/bet", [side, amount]) => Command::Bet {
            side: (*side).to_string(),
            amount: (*amount).to_string(),
        },
        ("/bet", _) => Command::Usage("⚠️ Usage: /bet [high/low] [amount]"),
        ("/history", _) => Command::History,
        ("/admin", ["list"]) => Command::AdminList,
        ("/admin", ["add", target]) => Command::AdminAdd {
            target: (*target).to_string(),
        },
        ("/admin", ["remove", target]) => Command::AdminRemove {
            target: (*target).to_string(),
        },
        ("/admin", _) => Command::Usage("⚠️ Usage: /admin list|add|remove [id]"),
        _ => Command::Unknown,
    };
    Some(parsed)
}

/// Routes inbound commands onto the core operations. Thin by design:
/// authorization checks and argument parsing live here, everything
/// with an invariant lives behind it.
pub struct Bot<T, S> {
    controller: Arc<WagerFlowController<T, S>>,
    admins: Arc<AdminSet<S>>,
}

impl<T, S> Clone for Bot<T, S> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            admins: self.admins.clone(),
        }
    }
}

impl<T, S> Bot<T, S>
where
    T: Transport + Send + Sync + 'static,
    S: SnapshotStore + 'static,
{
    pub fn new(
        controller: Arc<WagerFlowController<T, S>>,
        admins: Arc<AdminSet<S>>,
    ) -> Self {
        Self { controller, admins }
    }

    pub async fn handle_message(&self, chat: ChatId, from: AccountId, text: &str) {
        let Some(command) = parse_command(text) else {
            return;
        };
        match command {
            Command::Help => self.reply(chat, HELP_TEXT).await,
            Command::Balance => {
                let balance = self.controller.balance(from).await;
                self.reply(chat, &format!("👛 Your balance: 💰 {balance}"))
                    .await;
            }
            Command::Credit { target, amount } => {
                // Echo the caller's id so new admins can find theirs.
                self.reply(chat, &format!("ℹ️ Your user id is: {from}"))
                    .await;
                if !self.require_admin(chat, from).await {
                    return;
                }
                let (Ok(target), Ok(amount)) =
                    (target.parse::<AccountId>(), amount.parse::<u64>())
                else {
                    self.reply(chat, "❌ User id and amount must be numbers!")
                        .await;
                    return;
                };
                self.credit(chat, target, amount, &format!("user {target}"))
                    .await;
            }
            Command::Deposit { amount } => {
                if !self.require_admin(chat, from).await {
                    return;
                }
                let Ok(amount) = amount.parse::<u64>() else {
                    self.reply(chat, "❌ The amount must be a number!").await;
                    return;
                };
                self.credit(chat, from, amount, "you").await;
            }
            Command::Bet { side, amount } => {
                self.controller.place_wager(chat, from, &side, &amount).await;
            }
            Command::History => {
                let glyphs = self.controller.history_glyphs();
                let text = if glyphs.is_empty() {
                    "⚠️ No history yet".to_string()
                } else {
                    format!("📜 Current streak:\n{glyphs}")
                };
                self.reply(chat, &text).await;
            }
            Command::AdminList => {
                let listed: Vec<String> = self
                    .admins
                    .list()
                    .into_iter()
                    .map(|id| id.to_string())
                    .collect();
                self.reply(chat, &format!("👑 Admins: {}", listed.join(", ")))
                    .await;
            }
            Command::AdminAdd { target } => {
                if !self.require_admin(chat, from).await {
                    return;
                }
                let Ok(target) = target.parse::<AccountId>() else {
                    self.reply(chat, "❌ The user id must be a number!").await;
                    return;
                };
                let text = if self.admins.add(target) {
                    format!("✅ Added {target} to the admins.")
                } else {
                    format!("ℹ️ {target} already is an admin.")
                };
                self.reply(chat, &text).await;
            }
            Command::AdminRemove { target } => {
                if !self.require_admin(chat, from).await {
                    return;
                }
                let Ok(target) = target.parse::<AccountId>() else {
                    self.reply(chat, "❌ The user id must be a number!").await;
                    return;
                };
                let text = match self.admins.remove(target) {
                    Ok(()) => format!("✅ Removed {target} from the admins."),
                    Err(AdminSetError::LastAdmin) => {
                        "⚠️ Cannot remove the last admin!".to_string()
                    }
                    Err(AdminSetError::NotMember(_)) => {
                        format!("⚠️ {target} is not an admin.")
                    }
                };
                self.reply(chat, &text).await;
            }
            Command::Usage(usage) => self.reply(chat, usage).await,
            Command::Unknown => {
                self.reply(chat, "ℹ️ Unknown command, try /help").await;
            }
        }
    }

    async fn credit(&self, chat: ChatId, target: AccountId, amount: u64, who: &str) {
        match self.controller.credit(target, amount).await {
            Ok(balance) => {
                let text = format!(
                    "✅ Credited 💵 {amount} to {who}.\n👛 Current balance: 💰 {balance}"
                );
                self.reply(chat, &text).await;
            }
            Err(LedgerError::InvalidAmount) => {
                self.reply(chat, "⚠️ The amount must be greater than zero!")
                    .await;
            }
            Err(err) => {
                warn!(target, amount, error = %err, "credit rejected");
                self.reply(chat, "❌ Something went wrong, please try again later.")
                    .await;
            }
        }
    }

    async fn require_admin(&self, chat: ChatId, from: AccountId) -> bool {
        if self.admins.contains(from) {
            return true;
        }
        self.reply(chat, "❌ You are not allowed to use this command!")
            .await;
        false
    }

    async fn reply(&self, chat: ChatId, text: &str) {
        // Delivery failures are already logged by the gateway; there is
        // nothing further to tell the user on a channel that is down.
        let _ = self.controller.gateway().send_text(chat, text).await;
    }
}

impl<S: SnapshotStore + 'static> Bot<TelegramTransport, S> {
    /// Long-polls the transport and fans each inbound message out to
    /// its own task, so one wager's pacing never blocks another chat.
    pub async fn run(&self) -> Result<()> {
        let mut offset = 0i64;
        info!("🚀 hi-lo dice bot started, polling for updates");
        loop {
            let transport = self.controller.gateway().transport();
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("received interrupt, exiting");
                    return Ok(());
                }
                updates = transport.get_updates(offset, POLL_TIMEOUT) => {
                    let updates = match updates {
                        Ok(updates) => updates,
                        Err(err) => {
                            warn!(error = %err, "getUpdates failed, backing off");
                            tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                            continue;
                        }
                    };
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(message) = update.message else {
                            continue;
                        };
                        let (Some(from), Some(text)) = (message.from, message.text)
                        else {
                            continue;
                        };
                        let bot = self.clone();
                        let chat = message.chat.id;
                        tokio::spawn(async move {
                            bot.handle_message(chat, from.id, &text).await;
                        });
                    }
                }
            }
        }
    }
}
