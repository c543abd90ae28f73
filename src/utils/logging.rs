use crate::settings::CONFIG;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

pub fn init_logger() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(CONFIG.log.clone()));

    let term_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let subscriber = Registry::default().with(term_layer);

    // init may be called twice from tests; the second call is a no-op
    let _ = tracing::subscriber::set_global_default(subscriber);
    tracing::debug!("backupsmith {} logging initialized", CONFIG.app_version);
}
