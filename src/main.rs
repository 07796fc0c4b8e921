use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rapido::app::{self, AppContext};
use rapido::background::NotificationLog;
use rapido::dispatcher::Dispatcher;
use rapido::middleware::{CorsPolicy, TracingMiddleware};
use rapido::runtime_config::RuntimeConfig;
use rapido::server::{AppService, HttpServer};
use rapido::static_files::Templates;

#[allow(unsafe_code)]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let table = Arc::new(app::routes::build_table()?);

    let notify_log = Arc::new(NotificationLog::open(&config.notify_log)?);
    let ctx = Arc::new(AppContext::new(
        Templates::new(&config.template_dir),
        notify_log,
    ));

    let cors = Arc::new(CorsPolicy::permissive());
    let mut dispatcher = Dispatcher::new();
    // SAFETY: the May runtime is configured above, before any coroutine is
    // spawned for handler registration.
    unsafe {
        app::registry::register_all(&mut dispatcher, ctx);
    }
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(Arc::clone(&cors) as Arc<dyn rapido::middleware::Middleware>);

    let service = AppService::new(table, Arc::new(dispatcher))
        .with_cors(cors)
        .with_static_dir(&config.static_dir);

    let server = HttpServer(service).start(&config.addr)?;
    info!(addr = %config.addr, "rapido demo server listening");

    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        if let Some(signal) = signals.forever().next() {
            info!(signal, "shutdown signal received");
        }
        server.stop();
    }

    #[cfg(not(unix))]
    server
        .join()
        .map_err(|e| anyhow::anyhow!("server failed: {e:?}"))?;

    Ok(())
}
