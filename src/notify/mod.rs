pub mod email;

use anyhow::Result;

use crate::config::AlertConfig;

/// Out-of-band failure reporting. Delivery is best effort: callers log a
/// failed report and carry on.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn report_failure(&self, message: &str) -> Result<()>;
}

/// Writes failures to the log only; used when email alerts are off.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn report_failure(&self, message: &str) -> Result<()> {
        tracing::error!(target: "alert", "{message}");
        Ok(())
    }
}

/// Email when enabled in config, log-only otherwise.
pub fn notifier_from_config(cfg: &AlertConfig) -> Result<Box<dyn Notifier>> {
    if !cfg.enabled {
        tracing::debug!("email alerts disabled");
        return Ok(Box::new(LogNotifier));
    }
    Ok(Box::new(email::EmailNotifier::from_config(cfg)?))
}
