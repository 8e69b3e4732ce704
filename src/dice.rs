use crate::{
    gateway::{
        DeliveryError,
        DeliveryGateway,
    },
    history::Outcome,
    transport::{
        ChatId,
        Transport,
    },
};
use std::time::Duration;

/// Totals at or above this classify as High.
pub const HIGH_THRESHOLD: u16 = 10;

pub fn classify(total: u16) -> Outcome {
    if total >= HIGH_THRESHOLD {
        Outcome::High
    } else {
        Outcome::Low
    }
}

/// Cosmetic emphasis for extreme totals. No ledger effect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flair {
    SuperHigh,
    SuperLow,
}

pub fn flair(total: u16) -> Option<Flair> {
    match total {
        16.. => Some(Flair::SuperHigh),
        ..=4 => Some(Flair::SuperLow),
        _ => None,
    }
}

/// Delays between transport calls while rolling. The die animation on
/// the transport side needs breathing room before the value is shown.
#[derive(Clone, Copy, Debug)]
pub struct Pacing {
    pub between_rolls: Duration,
    pub settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_rolls: Duration::from_secs(1),
            settle: Duration::from_secs(2),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            between_rolls: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

/// A fully-resolved three-dice outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RollOutcome {
    pub rolls: [u8; 3],
    pub total: u16,
    pub outcome: Outcome,
}

impl RollOutcome {
    pub fn from_rolls(rolls: [u8; 3]) -> Self {
        let total = rolls.iter().map(|roll| u16::from(*roll)).sum();
        Self {
            rolls,
            total,
            outcome: classify(total),
        }
    }
}

/// Requests three die rolls sequentially through the gateway. Any roll
/// failing its delivery retries aborts the whole resolution; the caller
/// must not settle or record history for an aborted outcome.
pub async fn roll_three<T: Transport>(
    gateway: &DeliveryGateway<T>,
    chat: ChatId,
    pacing: Pacing,
) -> Result<RollOutcome, DeliveryError> {
    let mut rolls = [0u8; 3];
    for (index, slot) in rolls.iter_mut().enumerate() {
        if index > 0 {
            tokio::time::sleep(pacing.between_rolls).await;
        }
        let die = gateway.send_die(chat).await?;
        *slot = die.value;
    }
    // Let the last animation finish before announcing the total.
    tokio::time::sleep(pacing.settle).await;
    Ok(RollOutcome::from_rolls(rolls))
}
