use crate::ledger::AccountId;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    fs,
    path::PathBuf,
};

pub const TOKEN_ENV: &str = "TAIXIU_BOT_TOKEN";
pub const BOOTSTRAP_ADMIN_ENV: &str = "TAIXIU_BOOTSTRAP_ADMIN";

const DEFAULT_DATA_DIR: &str = "taixiu_bot_data";

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Bot API token. Injected via environment or file, never compiled in.
    pub token: String,
    pub api_url: Option<String>,
    pub data_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    /// Seeded as the sole admin when no usable admin document exists.
    pub bootstrap_admin: AccountId,
}

pub fn print_usage() {
    println!(
        "Usage: taixiu-bot [--token-file <path>] [--data-dir <path>]\n\
         [--log-dir <path>] [--bootstrap-admin <id>] [--api-url <url>]\n\
         \n\
         Flags:\n\
           --token-file <path>      Read the bot token from a file\n\
                                    (default: {TOKEN_ENV} environment variable)\n\
           --data-dir <path>        Snapshot directory (default: ./{DEFAULT_DATA_DIR})\n\
           --log-dir <path>         Write daily-rolling logs there instead of stderr\n\
           --bootstrap-admin <id>   Admin account seeded on first start\n\
                                    (default: {BOOTSTRAP_ADMIN_ENV} environment variable)\n\
           --api-url <url>          Override the Bot API base URL"
    );
}

/// Parses the process flags plus environment. `args` excludes argv[0].
pub fn from_args(args: impl Iterator<Item = String>) -> Result<BotConfig> {
    let mut args = args.peekable();
    let mut token_file: Option<String> = None;
    let mut data_dir: Option<String> = None;
    let mut log_dir: Option<String> = None;
    let mut api_url: Option<String> = None;
    let mut bootstrap_admin: Option<String> = None;

    while let Some(arg) = args.next() {
        let mut take_value = |name: &str| {
            args.next()
                .ok_or_else(|| eyre!("{name} requires a value argument"))
        };
        match arg.as_str() {
            "--token-file" => token_file = Some(take_value("--token-file")?),
            "--data-dir" => data_dir = Some(take_value("--data-dir")?),
            "--log-dir" => log_dir = Some(take_value("--log-dir")?),
            "--api-url" => api_url = Some(take_value("--api-url")?),
            "--bootstrap-admin" => {
                bootstrap_admin = Some(take_value("--bootstrap-admin")?)
            }
            other => return Err(eyre!("Unknown flag '{other}', see --help")),
        }
    }

    let token = match token_file {
        Some(raw) => {
            let path = expand(&raw);
            fs::read_to_string(&path)
                .wrap_err_with(|| {
                    format!("Failed to read token file {}", path.display())
                })?
                .trim()
                .to_string()
        }
        None => std::env::var(TOKEN_ENV).map_err(|_| {
            eyre!("No bot token: set {TOKEN_ENV} or pass --token-file")
        })?,
    };
    if token.is_empty() {
        return Err(eyre!("Bot token is empty"));
    }

    let bootstrap_admin = match bootstrap_admin {
        Some(raw) => raw,
        None => std::env::var(BOOTSTRAP_ADMIN_ENV).map_err(|_| {
            eyre!(
                "No bootstrap admin: set {BOOTSTRAP_ADMIN_ENV} or pass \
                 --bootstrap-admin"
            )
        })?,
    };
    let bootstrap_admin: AccountId = bootstrap_admin
        .parse()
        .wrap_err("Bootstrap admin must be a numeric account id")?;

    Ok(BotConfig {
        token,
        api_url,
        data_dir: data_dir
            .map(|raw| expand(&raw))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        log_dir: log_dir.map(|raw| expand(&raw)),
        bootstrap_admin,
    })
}

fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
