use crate::{
    dice::{
        Flair,
        Pacing,
        RollOutcome,
        flair,
        roll_three,
    },
    gateway::DeliveryGateway,
    history::{
        HistoryRing,
        Outcome,
    },
    ledger::{
        AccountId,
        BalanceLedger,
        LedgerError,
    },
    store::SnapshotStore,
    transport::{
        ChatId,
        Transport,
    },
};
use std::sync::{
    Arc,
    Mutex,
};
use tracing::{
    info,
    warn,
};

/// Wins pay 1.9x the stake, floored. Integer arithmetic only; money
/// never touches floating point.
pub fn winnings_for(amount: u64) -> u64 {
    let gross = u128::from(amount) * 19 / 10;
    gross.min(u128::from(u64::MAX)) as u64
}

/// Flavor-text threshold; no mechanical effect.
const JACKPOT_THRESHOLD: u64 = 100_000;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum WagerError {
    #[error("side must be 'high' or 'low'")]
    InvalidSide,

    #[error("amount must be a positive integer")]
    InvalidAmount,
}

/// Parses the raw command arguments of a wager. Malformed input never
/// reaches the ledger.
pub fn parse_wager(side: &str, amount: &str) -> Result<(Outcome, u64), WagerError> {
    let side = match side.to_ascii_lowercase().as_str() {
        "high" | "tai" => Outcome::High,
        "low" | "xiu" => Outcome::Low,
        _ => return Err(WagerError::InvalidSide),
    };
    let amount: u64 = amount.parse().map_err(|_| WagerError::InvalidAmount)?;
    if amount == 0 {
        return Err(WagerError::InvalidAmount);
    }
    Ok((side, amount))
}

/// Orchestrates one wager end-to-end: validate, reserve, roll, settle,
/// report. Shared by every in-flight chat.
pub struct WagerFlowController<T, S> {
    gateway: DeliveryGateway<T>,
    ledger: BalanceLedger<S>,
    history: Mutex<HistoryRing>,
    store: Arc<S>,
    pacing: Pacing,
}

impl<T: Transport, S: SnapshotStore> WagerFlowController<T, S> {
    pub fn new(
        gateway: DeliveryGateway<T>,
        ledger: BalanceLedger<S>,
        history: HistoryRing,
        store: Arc<S>,
        pacing: Pacing,
    ) -> Self {
        Self {
            gateway,
            ledger,
            history: Mutex::new(history),
            store,
            pacing,
        }
    }

    pub fn gateway(&self) -> &DeliveryGateway<T> {
        &self.gateway
    }

    pub async fn balance(&self, account: AccountId) -> u64 {
        self.ledger.balance(account).await
    }

    pub async fn credit(
        &self,
        account: AccountId,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        self.ledger.credit(account, amount).await
    }

    pub fn history_glyphs(&self) -> String {
        self.history.lock().unwrap().glyphs()
    }

    /// Runs one wager. Every abort path sends exactly one explanatory
    /// message; a lost report after settlement is logged but never
    /// rolled back.
    pub async fn place_wager(
        &self,
        chat: ChatId,
        account: AccountId,
        side: &str,
        amount: &str,
    ) {
        // Validating
        let (side, amount) = match parse_wager(side, amount) {
            Ok(wager) => wager,
            Err(WagerError::InvalidSide) => {
                let _ = self
                    .gateway
                    .send_text(chat, "❌ Pick 'high' or 'low'!")
                    .await;
                return;
            }
            Err(WagerError::InvalidAmount) => {
                let _ = self
                    .gateway
                    .send_text(chat, "⚠️ The bet amount must be a positive number!")
                    .await;
                return;
            }
        };

        // Reserving
        let hold = match self.ledger.reserve(account, amount).await {
            Ok(hold) => hold,
            Err(LedgerError::InsufficientFunds { available, .. }) => {
                let text = format!(
                    "❌ You're out of chips! You have 💰 {available}; \
                     ask an admin to top you up 🚀"
                );
                let _ = self.gateway.send_text(chat, &text).await;
                return;
            }
            Err(LedgerError::InvalidAmount) => {
                let _ = self
                    .gateway
                    .send_text(chat, "⚠️ The bet amount must be a positive number!")
                    .await;
                return;
            }
        };

        let Ok(processing) = self
            .gateway
            .send_text(chat, "🎯 Rolling the dice... ⏳")
            .await
        else {
            self.ledger.release(hold).await;
            let _ = self
                .gateway
                .send_text(chat, "❌ Something went wrong, please try again later.")
                .await;
            return;
        };

        // Cosmetic echo of the player's pick; losing it is harmless.
        let pick = format!("You picked: {} {}", side.glyph(), side);
        let _ = self.gateway.send_text(chat, &pick).await;

        // Rolling(1..3)
        let resolved = match roll_three(&self.gateway, chat, self.pacing).await {
            Ok(resolved) => resolved,
            Err(_) => {
                self.ledger.release(hold).await;
                let _ = self
                    .gateway
                    .send_text(
                        chat,
                        "❌ Something went wrong while rolling, please try again later.",
                    )
                    .await;
                return;
            }
        };

        // Settling: history first, then the ledger; both happen only on
        // a fully-computed total.
        let glyphs = {
            let mut history = self.history.lock().unwrap();
            history.push(resolved.outcome);
            let entries: Vec<Outcome> = history.entries().collect();
            let glyphs = history.glyphs();
            drop(history);
            if let Err(err) = self.store.save_history(&entries) {
                warn!(error = %err, "failed to persist history, in-memory state stays authoritative");
            }
            glyphs
        };

        let won = side == resolved.outcome;
        let (balance, winnings) = if won {
            let winnings = winnings_for(amount);
            (self.ledger.settle_win(hold, winnings).await, winnings)
        } else {
            (self.ledger.settle_loss(hold).await, 0)
        };
        info!(
            account,
            amount,
            total = resolved.total,
            outcome = %resolved.outcome,
            won,
            balance,
            "wager settled"
        );

        // The processing notice is noise once the dice are down.
        let _ = self.gateway.delete_message(chat, processing).await;

        // Reporting
        let report = if won {
            report_win(resolved, winnings, balance, &glyphs)
        } else {
            report_loss(resolved, amount, balance, &glyphs)
        };
        if self.gateway.send_text(chat, &report).await.is_err() {
            warn!(
                account, chat,
                "result report lost after settlement; balance query will show the outcome"
            );
        }
    }
}

fn flair_text(resolved: RollOutcome) -> &'static str {
    match flair(resolved.total) {
        Some(Flair::SuperHigh) => " 🔥 SUPER HIGH! 🔥",
        Some(Flair::SuperLow) => " ❄️ SUPER LOW! ❄️",
        None => "",
    }
}

fn result_line(resolved: RollOutcome) -> String {
    let [r1, r2, r3] = resolved.rolls;
    format!(
        "🎲 Result: {r1} + {r2} + {r3} = {total} {glyph} ({outcome}){flair}",
        total = resolved.total,
        glyph = resolved.outcome.glyph(),
        outcome = resolved.outcome,
        flair = flair_text(resolved),
    )
}

fn report_win(
    resolved: RollOutcome,
    winnings: u64,
    balance: u64,
    glyphs: &str,
) -> String {
    let win_line = if winnings >= JACKPOT_THRESHOLD {
        format!("🏆 🎉 JACKPOT! You won 💰 {winnings}! 🎉 🏆")
    } else {
        format!("🎉 Congratulations! You won 💰 {winnings}!")
    };
    format!(
        "{}\n{win_line}\n👛 Current balance: 💰 {balance}\n📜 Streak: {glyphs}",
        result_line(resolved),
    )
}

fn report_loss(resolved: RollOutcome, amount: u64, balance: u64, glyphs: &str) -> String {
    format!(
        "{}\n😢 Tough luck! You lost 💰 {amount}.\n\
         👛 Current balance: 💰 {balance}\n📜 Streak: {glyphs}",
        result_line(resolved),
    )
}
