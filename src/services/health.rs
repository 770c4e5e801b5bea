use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, trace};

use crate::errors::Result;

/// 单次探活的超时时间
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// 可被 `/readyz` 探活的依赖（存储、缓存）
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeStatus {
    pub name: &'static str,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub checks: Vec<ProbeStatus>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().all(|c| c.healthy)
    }
}

pub struct HealthService {
    probes: Vec<Arc<dyn HealthProbe>>,
    timeout: Duration,
    started_at: DateTime<Utc>,
}

impl HealthService {
    pub fn new(probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        Self::with_timeout(probes, PROBE_TIMEOUT)
    }

    pub fn with_timeout(probes: Vec<Arc<dyn HealthProbe>>, timeout: Duration) -> Self {
        Self {
            probes,
            timeout,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// 依次探活所有依赖，任何一个失败或超时即整体不就绪
    pub async fn check(&self) -> HealthReport {
        let mut checks = Vec::with_capacity(self.probes.len());

        for probe in &self.probes {
            let start = Instant::now();
            let outcome = tokio::time::timeout(self.timeout, probe.ping()).await;
            let latency_ms = start.elapsed().as_millis() as u64;

            let error = match outcome {
                Ok(Ok(())) => {
                    trace!("Probe '{}' healthy in {} ms", probe.name(), latency_ms);
                    None
                }
                Ok(Err(e)) => {
                    error!("Probe '{}' failed: {}", probe.name(), e);
                    Some(e.to_string())
                }
                Err(_) => {
                    error!("Probe '{}' timed out after {:?}", probe.name(), self.timeout);
                    Some("timeout".to_string())
                }
            };

            checks.push(ProbeStatus {
                name: probe.name(),
                healthy: error.is_none(),
                error,
                latency_ms,
            });
        }

        let healthy = checks.iter().all(|c| c.healthy);
        HealthReport {
            status: if healthy { "healthy" } else { "unhealthy" },
            timestamp: Utc::now(),
            uptime_secs: self.uptime_secs(),
            checks,
        }
    }
}
