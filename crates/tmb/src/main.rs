use std::path::Path;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use tmb_core::attach::{AttachmentPipeline, HttpFetcher};
use tmb_core::compose::{Labels, MarkupDialect};
use tmb_core::config::Config;
use tmb_core::identity::IdentityResolver;
use tmb_core::outbound::{DisabledMessenger, DisabledTelegram, MessengerPort, TelegramPort};
use tmb_core::routing::RoutingTable;
use tmb_messenger::api::{MessengerApi, UnlinkedApi};
use tmb_messenger::extract::MsgrExtractor;
use tmb_messenger::relay::MsgrRelayState;
use tmb_messenger::send::MessengerSender;
use tmb_telegram::extract::TgExtractor;
use tmb_telegram::fetch::TelegramFetcher;
use tmb_telegram::router::{run_polling, TgRelayState};
use tmb_telegram::TelegramSender;

const CONFIG_PATH: &str = "config.json";
const SESSION_PATH: &str = "appstate.json";

#[tokio::main]
async fn main() {
    // A missing config writes a template and exits; there is no steady
    // state without one.
    let cfg = match Config::load(Path::new(CONFIG_PATH)) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    tmb_core::logging::init(cfg.debug);

    if cfg.messenger && !Path::new(SESSION_PATH).exists() {
        eprintln!("{SESSION_PATH} not found; log in with the messenger client first");
        std::process::exit(1);
    }

    let routes = Arc::new(RoutingTable::from_config(&cfg));
    let labels = Arc::new(Labels::default());

    let bot = cfg.telegram.then(|| Bot::new(cfg.tg_token.clone()));
    let mut self_id = 0i64;
    if let Some(bot) = &bot {
        match bot.get_me().await {
            Ok(me) => {
                self_id = me.user.id.0 as i64;
                info!("telegram bot @{} connected", me.username());
            }
            Err(e) => {
                eprintln!("telegram login failed: {e}");
                std::process::exit(1);
            }
        }
    }
    let telegram_port: Arc<dyn TelegramPort> = match &bot {
        Some(bot) => Arc::new(TelegramSender::new(bot.clone(), Some(ParseMode::Markdown))),
        None => Arc::new(DisabledTelegram),
    };

    // The Messenger network client links in from outside the process; the
    // stand-in keeps the pipeline wired but refuses sends until then.
    let api: Arc<dyn MessengerApi> = Arc::new(UnlinkedApi);
    let messenger_port: Arc<dyn MessengerPort> = if cfg.messenger {
        warn!("messenger client not linked; outbound messenger sends will fail");
        Arc::new(MessengerSender::new(api.clone()))
    } else {
        Arc::new(DisabledMessenger)
    };

    // Messenger -> Telegram. The linked client publishes events through
    // this sender; it stays alive for the life of the process.
    let (_event_tx, event_rx) = tokio::sync::mpsc::channel(64);
    let msgr_state = MsgrRelayState {
        routes: routes.clone(),
        api,
        extractor: Arc::new(MsgrExtractor::new(cfg.preview_text_limit)),
        pipeline: Arc::new(AttachmentPipeline::new(
            Arc::new(HttpFetcher::default()),
            cfg.download_to_buffer,
        )),
        telegram: telegram_port,
        labels: labels.clone(),
        dialect: MarkupDialect::Markdown,
    };
    tokio::spawn(tmb_messenger::relay::run(event_rx, msgr_state));

    // Telegram -> Messenger.
    match bot {
        Some(bot) => {
            let resolver = IdentityResolver::new(cfg.tg_users.clone());
            let state = TgRelayState {
                routes,
                extractor: Arc::new(TgExtractor::new(self_id, cfg.preview_text_limit, resolver)),
                pipeline: Arc::new(AttachmentPipeline::new(
                    Arc::new(TelegramFetcher::new(bot.clone())),
                    cfg.download_to_buffer,
                )),
                messenger: messenger_port,
                labels,
                dialect: MarkupDialect::Markdown,
            };
            run_polling(bot, state).await;
        }
        None => {
            info!("telegram disabled; idling until interrupted");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
