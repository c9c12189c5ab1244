use pythonsd_web::config::{AppState, Config};
use pythonsd_web::{assets, logger, server};
use std::sync::Arc;
use tokio::sync::Notify;

const USAGE: &str = "usage: pythonsd-web [--config <path>] [serve|collectstatic]";

enum Command {
    Serve,
    CollectStatic,
}

struct Args {
    config_path: String,
    command: Command,
}

fn parse_args() -> Result<Args, String> {
    let mut config_path = "config".to_string();
    let mut command = Command::Serve;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                config_path = args
                    .next()
                    .ok_or_else(|| format!("{arg} needs a value\n{USAGE}"))?;
            }
            "serve" => command = Command::Serve,
            "collectstatic" => command = Command::CollectStatic,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown argument '{other}'\n{USAGE}")),
        }
    }

    Ok(Args {
        config_path,
        command,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;
    let cfg = Config::load_from(&args.config_path)?;
    logger::init(&cfg)?;

    match args.command {
        Command::CollectStatic => {
            let finders = assets::configured_finders(&cfg.assets);
            assets::collect_static(&finders, &cfg.assets.static_root, &cfg.assets.ignore_patterns)?;
            Ok(())
        }
        Command::Serve => serve(cfg),
    }
}

fn serve(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Worker thread count from configuration, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(AppState::new(&cfg));

    let shutdown = Arc::new(Notify::new());
    server::signal::start_signal_handler(Arc::clone(&shutdown))?;

    logger::log_server_start(&addr, &cfg);

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local.run_until(server::run(listener, state, shutdown)).await;
    Ok(())
}
