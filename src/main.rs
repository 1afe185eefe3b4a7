use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookrack::dispatcher::Dispatcher;
use bookrack::middleware::{CustomHeaderMiddleware, TracingMiddleware};
use bookrack::registry;
use bookrack::runtime_config::RuntimeConfig;
use bookrack::server::{AppService, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "bookrack", about = "In-memory books REST server")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "BOOKRACK_ADDR", default_value = "0.0.0.0:9090")]
    addr: String,

    /// Print the routing table at startup.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let router = registry::build_router();
    if args.verbose {
        router.dump_routes();
    }

    let mut dispatcher = Dispatcher::new();
    // SAFETY: coroutine spawning during single-threaded startup, after
    // the may runtime is configured above.
    unsafe {
        registry::register_all(&mut dispatcher);
    }
    dispatcher.add_middleware(Arc::new(CustomHeaderMiddleware::new(
        "X-Custom-Header",
        "bookrack",
    )));
    dispatcher.add_middleware(Arc::new(TracingMiddleware));

    let service = AppService::new(Arc::new(router), Arc::new(dispatcher));

    info!(addr = %args.addr, "starting bookrack server");
    let server = HttpServer(service).start(&args.addr)?;
    println!("bookrack listening on http://{}", args.addr);

    #[cfg(unix)]
    {
        wait_for_shutdown_signal()?;
        info!("stopping the server");
        server.stop();
    }
    #[cfg(not(unix))]
    server
        .join()
        .map_err(|e| anyhow::anyhow!("server exited abnormally: {e:?}"))?;

    Ok(())
}

/// Block until SIGINT or SIGTERM arrives.
#[cfg(unix)]
fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "shutdown signal received");
    }
    Ok(())
}
