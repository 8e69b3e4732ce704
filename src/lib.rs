//! Hi-lo (tài xỉu) dice wager bot: three dice are rolled through the
//! chat transport, the sum classifies as High (>= 10) or Low, and wins
//! pay 1.9x the stake against a snapshot-backed balance ledger.

pub mod admin;
pub mod config;
pub mod dice;
pub mod dispatch;
pub mod gateway;
pub mod history;
pub mod ledger;
pub mod store;
pub mod telegram;
pub mod transport;
pub mod wager;

pub mod test_helpers;
