use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::ApiSettings;
use crate::cache::{CacheFactory, CacheHandles};
use crate::config::AppConfig;
use crate::services::{BackgroundTasks, HealthService, ShortenerService, ShortenerSettings};
use crate::storage::{StorageFactory, StorageHandles};
use crate::utils::RandomCodeGenerator;

/// 服务器运行所需的全部共享对象
pub struct StartupContext {
    pub shortener: Arc<ShortenerService>,
    pub health: Arc<HealthService>,
    pub background: Arc<BackgroundTasks>,
    pub settings: ApiSettings,
}

/// 连接存储与缓存并组装服务
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to initialize storage backend")?;

    let cache = CacheFactory::create(&config.cache)
        .await
        .context("Failed to initialize cache backend")?;

    let context = assemble(config, storage, cache);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}

/// 用已创建的存储与缓存组装服务，需在 tokio 运行时内调用
pub fn assemble(config: &AppConfig, storage: StorageHandles, cache: CacheHandles) -> StartupContext {
    let background = BackgroundTasks::start(&config.background);

    let shortener = Arc::new(ShortenerService::new(
        storage.urls,
        cache.cache,
        storage.analytics,
        Arc::new(RandomCodeGenerator::new(config.shortener.code_length)),
        background.clone(),
        ShortenerSettings::from_config(config),
    ));

    let health = Arc::new(HealthService::new(vec![storage.probe, cache.probe]));

    StartupContext {
        shortener,
        health,
        background,
        settings: ApiSettings::from_config(config),
    }
}
