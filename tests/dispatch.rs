#![allow(non_snake_case)]

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};
use taixiu_bot::{
    admin::AdminSet,
    dice::Pacing,
    dispatch::Bot,
    gateway::DeliveryGateway,
    history::HistoryRing,
    ledger::{
        AccountId,
        BalanceLedger,
    },
    store::InMemorySnapshotStore,
    test_helpers::FakeTransport,
    transport::ChatId,
    wager::WagerFlowController,
};

const CHAT: ChatId = 1;
const ADMIN: AccountId = 10;
const PLAYER: AccountId = 20;

struct TestContext {
    bot: Bot<FakeTransport, InMemorySnapshotStore>,
    controller: Arc<WagerFlowController<FakeTransport, InMemorySnapshotStore>>,
    store: Arc<InMemorySnapshotStore>,
}

impl TestContext {
    fn new() -> Self {
        let store = Arc::new(InMemorySnapshotStore::new());
        let gateway = DeliveryGateway::with_backoff_unit(
            FakeTransport::new(),
            Duration::from_millis(1),
        );
        let ledger = BalanceLedger::new(
            HashMap::from([(PLAYER, 1000)]),
            store.clone(),
        );
        let controller = Arc::new(WagerFlowController::new(
            gateway,
            ledger,
            HistoryRing::new(),
            store.clone(),
            Pacing::none(),
        ));
        let admins = Arc::new(AdminSet::new([ADMIN].into(), store.clone()));
        Self {
            bot: Bot::new(controller.clone(), admins),
            controller,
            store,
        }
    }

    fn transport(&self) -> &FakeTransport {
        self.controller.gateway().transport()
    }

    fn replies(&self) -> Vec<String> {
        self.transport().texts_for(CHAT)
    }

    fn last_reply(&self) -> String {
        self.replies().last().cloned().expect("a reply was sent")
    }
}

#[tokio::test]
async fn handle_message__balance_reports_the_callers_chips() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, PLAYER, "/balance").await;

    // then
    assert_eq!(ctx.last_reply(), "👛 Your balance: 💰 1000");
}

#[tokio::test]
async fn handle_message__balance_of_an_unseen_account_is_zero() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, 555, "/balance").await;

    // then
    assert_eq!(ctx.last_reply(), "👛 Your balance: 💰 0");
}

#[tokio::test]
async fn handle_message__credit_requires_admin_rights() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot
        .handle_message(CHAT, PLAYER, "/credit 20 500")
        .await;

    // then: the id echo still goes out, then the refusal
    let replies = ctx.replies();
    assert_eq!(replies[0], format!("ℹ️ Your user id is: {PLAYER}"));
    assert!(replies[1].contains("not allowed"));
    assert_eq!(ctx.controller.balance(PLAYER).await, 1000);
}

#[tokio::test]
async fn handle_message__admin_credit_tops_up_and_persists() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot
        .handle_message(CHAT, ADMIN, "/credit 20 500")
        .await;

    // then
    assert_eq!(ctx.controller.balance(PLAYER).await, 1500);
    assert_eq!(ctx.store.persisted().balances.get(&PLAYER), Some(&1500));
    assert!(ctx.last_reply().contains("Current balance: 💰 1500"));
}

#[tokio::test]
async fn handle_message__deposit_credits_the_admin_themselves() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, ADMIN, "/deposit 300").await;

    // then
    assert_eq!(ctx.controller.balance(ADMIN).await, 300);
    assert!(ctx.last_reply().contains("Credited 💵 300 to you"));
}

#[tokio::test]
async fn handle_message__credit_of_zero_is_rejected() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, ADMIN, "/credit 20 0").await;

    // then
    assert!(ctx.last_reply().contains("greater than zero"));
    assert_eq!(ctx.controller.balance(PLAYER).await, 1000);
}

#[tokio::test]
async fn handle_message__history_mentions_the_empty_case() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, PLAYER, "/history").await;

    // then
    assert_eq!(ctx.last_reply(), "⚠️ No history yet");
}

#[tokio::test]
async fn handle_message__history_shows_the_streak_after_a_wager() {
    // given
    let ctx = TestContext::new();
    ctx.transport().script_rolls([4, 4, 4]);
    ctx.bot.handle_message(CHAT, PLAYER, "/bet high 100").await;

    // when
    ctx.bot.handle_message(CHAT, PLAYER, "/history").await;

    // then
    assert_eq!(ctx.last_reply(), "📜 Current streak:\n🔴");
}

#[tokio::test]
async fn handle_message__bet_routes_into_the_wager_flow() {
    // given
    let ctx = TestContext::new();
    ctx.transport().script_rolls([1, 2, 3]);

    // when
    ctx.bot.handle_message(CHAT, PLAYER, "/bet low 100").await;

    // then: total 6 is Low, the bet won
    assert_eq!(ctx.controller.balance(PLAYER).await, 1090);
}

#[tokio::test]
async fn handle_message__admin_add_then_list() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, ADMIN, "/admin add 30").await;
    ctx.bot.handle_message(CHAT, ADMIN, "/admin list").await;

    // then
    assert_eq!(ctx.last_reply(), "👑 Admins: 10, 30");
    assert!(ctx.store.persisted().admins.contains(&30));
}

#[tokio::test]
async fn handle_message__removing_the_last_admin_is_refused() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot
        .handle_message(CHAT, ADMIN, &format!("/admin remove {ADMIN}"))
        .await;

    // then
    assert_eq!(ctx.last_reply(), "⚠️ Cannot remove the last admin!");
}

#[tokio::test]
async fn handle_message__unknown_command_points_at_help() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, PLAYER, "/jackpot").await;

    // then
    assert!(ctx.last_reply().contains("/help"));
}

#[tokio::test]
async fn handle_message__plain_chatter_is_ignored() {
    // given
    let ctx = TestContext::new();

    // when
    ctx.bot.handle_message(CHAT, PLAYER, "good luck all").await;

    // then
    assert!(ctx.replies().is_empty());
}
