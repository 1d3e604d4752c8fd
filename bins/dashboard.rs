use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // load .env first so RUST_LOG and API_BASE_URL take effect
    dotenv().ok();
    common::utils::logging::init_logging_default();
    info!(service = "dashboard", event = "logger_init", "tracing subscriber initialized");
}

async fn run() -> anyhow::Result<()> {
    let cfg = configs::AppConfig::load_and_validate()?;
    service::runtime::ensure_env(&cfg).await?;
    let storefront = service::runtime::build(&cfg).await?;

    let snapshot = storefront.stats.get_dashboard().await;
    let me = storefront.ledger.current_identity().await;
    let orders = storefront.ledger.get_user_orders(&me).await?;
    info!(service = "dashboard", event = "loaded", user = %me, orders = orders.len(), "dashboard loaded");

    let out = serde_json::json!({
        "dashboard": snapshot,
        "user": me,
        "orders": orders,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn main() -> std::process::ExitCode {
    init_logging();

    let run_id = Uuid::new_v4();
    let version = env!("CARGO_PKG_VERSION");
    info!(service = "dashboard", event = "start", %run_id, version, "dashboard starting");

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "dashboard", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    match rt.block_on(run()) {
        Ok(()) => {
            info!(service = "dashboard", event = "stop", %run_id, "dashboard finished");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "dashboard", event = "run_failed", %run_id, error = %e, "dashboard failed");
            std::process::ExitCode::FAILURE
        }
    }
}
