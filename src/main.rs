use color_eyre::eyre::Result;
use std::{
    path::Path,
    sync::{
        Arc,
        OnceLock,
    },
};
use taixiu_bot::{
    admin::AdminSet,
    config::{
        self,
        BotConfig,
    },
    dice::Pacing,
    dispatch::Bot,
    gateway::DeliveryGateway,
    history::HistoryRing,
    ledger::BalanceLedger,
    store::{
        FileSnapshotStore,
        SnapshotStore,
    },
    telegram::TelegramTransport,
    wager::WagerFlowController,
};
use tracing::info;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn init_tracing(log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("taixiu_bot=info,info"));
    match log_dir {
        Some(dir) => {
            let appender = rolling::daily(dir, "taixiu-bot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            let _ = LOG_GUARD.set(guard);
        }
        None => {
            fmt().with_env_filter(filter).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let mut args = std::env::args().skip(1).peekable();
    if matches!(args.peek().map(String::as_str), Some("--help" | "-h")) {
        config::print_usage();
        return Ok(());
    }
    let config = config::from_args(args)?;
    init_tracing(config.log_dir.as_deref());
    run(config).await
}

async fn run(config: BotConfig) -> Result<()> {
    let store = Arc::new(FileSnapshotStore::open(&config.data_dir)?);
    let state = store.load(config.bootstrap_admin);
    info!(
        accounts = state.balances.len(),
        history_entries = state.history.len(),
        admins = state.admins.len(),
        data_dir = %store.dir().display(),
        "restored snapshot state"
    );

    let transport = match &config.api_url {
        Some(url) => TelegramTransport::with_api_url(url, &config.token)?,
        None => TelegramTransport::new(&config.token)?,
    };
    let gateway = DeliveryGateway::new(transport);
    let ledger = BalanceLedger::new(state.balances, store.clone());
    let history = HistoryRing::from_entries(state.history);
    let admins = Arc::new(AdminSet::new(state.admins, store.clone()));
    let controller = Arc::new(WagerFlowController::new(
        gateway,
        ledger,
        history,
        store,
        Pacing::default(),
    ));

    Bot::new(controller, admins).run().await
}
