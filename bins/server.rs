use std::process::ExitCode;

use configs::AppConfig;
use tracing::{error, info};
use uuid::Uuid;

fn install_panic_hook(instance_id: Uuid) {
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "taskhub", event = "panic", %instance_id, message = %info, "unhandled panic occurred");
    }));
}

/// `TOKIO_WORKER_THREADS` overrides `server.worker_threads`.
fn build_runtime(cfg: &AppConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .or(cfg.server.worker_threads);
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(n) = threads {
        builder.worker_threads(n);
    }
    builder.build()
}

async fn serve(cfg: AppConfig, instance_id: Uuid) -> ExitCode {
    tokio::select! {
        res = server::run(cfg) => match res {
            Ok(()) => {
                info!(service = "taskhub", event = "stop", %instance_id, "server stopped");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "taskhub", event = "run_failed", error = %e, "server exited with error");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!(service = "taskhub", event = "shutdown_signal", %instance_id, "received Ctrl+C, shutting down");
            ExitCode::SUCCESS
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let instance_id = Uuid::new_v4();
    install_panic_hook(instance_id);

    let cfg = match AppConfig::load_or_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "taskhub", event = "config_invalid", error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };
    let rt = match build_runtime(&cfg) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "taskhub", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "taskhub",
        event = "start",
        %instance_id,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        base_domain = %cfg.tenancy.base_domain,
        "taskhub server starting"
    );
    rt.block_on(serve(cfg, instance_id))
}
