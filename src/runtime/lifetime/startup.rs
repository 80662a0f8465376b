use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::services::{
    ExpirySweeper, LinkNotifier, LinkRegistry, RegistrySettings, ShortCodeGenerator,
};
use crate::storage::{LinkStore, UserDirectory};

/// Everything a front end needs, wired from one [`AppConfig`].
pub struct StartupContext {
    pub config: AppConfig,
    pub store: Arc<LinkStore>,
    pub users: Arc<UserDirectory>,
    pub generator: Arc<ShortCodeGenerator>,
    pub registry: Arc<LinkRegistry>,
    pub sweeper: Arc<ExpirySweeper>,
}

/// 准备启动上下文
///
/// `make_notifier` receives the user directory so front ends can look up
/// recipients. The sweeper is built but not started.
pub fn prepare_startup<F>(config: AppConfig, make_notifier: F) -> Result<StartupContext>
where
    F: FnOnce(&Arc<UserDirectory>) -> Arc<dyn LinkNotifier>,
{
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    config.validate().context("Invalid configuration")?;

    let store = Arc::new(LinkStore::new());
    let users = Arc::new(UserDirectory::new(config.security.user_session_ttl_hours));
    let generator = Arc::new(ShortCodeGenerator::new(
        config.link.generation_algorithm,
        config.link.short_code_length,
    ));
    let notifier = make_notifier(&users);

    let registry = Arc::new(LinkRegistry::new(
        store.clone(),
        generator.clone(),
        users.clone(),
        notifier.clone(),
        RegistrySettings::from(&config),
    ));

    let sweeper = Arc::new(
        ExpirySweeper::from_config(store.clone(), notifier, &config.cleanup)
            .with_user_directory(users.clone()),
    );

    info!(
        "Link core ready: {} codes of length {}, {}h TTL, {} clicks by default",
        generator.strategy(),
        generator.code_length(),
        config.link.default_ttl_hours,
        config.link.default_max_clicks
    );
    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        config,
        store,
        users,
        generator,
        registry,
        sweeper,
    })
}
