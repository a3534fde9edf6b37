use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::Mutex;

use gtb_core::{
    admins::AdminStore,
    config::Config,
    domain::UserId,
    ports::{GroupClient, Notifier},
    transfer::{RunHandle, TransferOrchestrator, TransferSettings},
};

use crate::{handlers, TelegramNotifier};

pub struct AppState {
    pub cfg: Arc<Config>,
    pub admins: Arc<AdminStore>,
    pub orchestrator: Arc<TransferOrchestrator>,
    pub notifier: Arc<dyn Notifier>,
    /// Pending transfer setups, keyed by chat id.
    pub setups: Mutex<HashMap<i64, TransferSetup>>,
    /// Background runs started from this process, keyed by chat id.
    pub runs: Mutex<HashMap<i64, RunHandle>>,
}

/// Source/target collection state for one chat's `/scrapemembers` flow.
#[derive(Clone, Debug)]
pub struct TransferSetup {
    pub admin: UserId,
    pub source: Option<String>,
    pub target: Option<String>,
    pub awaiting: Option<SetupField>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupField {
    Source,
    Target,
}

/// Run the bot on long polling.
///
/// The user-API client handle is injected: establishing and authenticating
/// that session belongs to the embedding application, and a missing handle
/// surfaces there as `Error::ClientInit` before this function is reached.
pub async fn run_polling(cfg: Arc<Config>, client: Arc<dyn GroupClient>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        println!("gtb started: @{}", me.username());
    }

    let admins = Arc::new(AdminStore::load(
        cfg.admin_store_path.clone(),
        &cfg.admin_ids,
    )?);
    println!(
        "Admin store: {} ({} admins)",
        admins.path().display(),
        admins.list().len()
    );

    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(bot.clone()));
    let orchestrator = Arc::new(TransferOrchestrator::new(
        client,
        TransferSettings::from_config(&cfg),
    ));

    let state = Arc::new(AppState {
        cfg,
        admins,
        orchestrator,
        notifier,
        setups: Mutex::new(HashMap::new()),
        runs: Mutex::new(HashMap::new()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
