use anyhow::Context;
use insights_agent::{
    app::{App, Services},
    auth::{AuthContext, AuthProvider, SupabaseAuth},
    config::load_config,
    logging::{init_logging, log_dir},
    store::SupabaseStore,
    ui::run_ui,
    webhook::WebhookClient,
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = load_config().context("Failed to load configuration")?;
    let _logger = init_logging(&config.log_level).context("Failed to start logging")?;
    log::info!("Starting insights-agent, logs in {}", log_dir().display());

    let auth = Arc::new(SupabaseAuth::new(&config)?);
    let store = SupabaseStore::new(&config, auth.subscribe())?;
    let bot = WebhookClient::new(&config)?;

    let auth_context = AuthContext::init(auth).await;
    let signed_in = auth_context.current_user().is_some();

    let services = Arc::new(Services {
        auth: auth_context,
        store: Arc::new(store),
        bot: Arc::new(bot),
        config,
    });
    let app = Arc::new(Mutex::new(App::new(signed_in)));

    let result = run_ui(app, services.clone()).await;
    services.auth.shutdown();

    if let Err(e) = &result {
        log::error!("UI exited with an error: {}", e);
    }
    result.context("Terminal UI failed")
}
