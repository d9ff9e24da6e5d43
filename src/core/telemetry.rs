use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Filter applied when `RUST_LOG` is unset: the configured level for this
/// service, with chatty dependencies capped at warn.
fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},hyper=warn,reqwest=warn,sqlx=warn"))
}

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&settings.telemetry().log_level));

    let builder = fmt().with_env_filter(filter).with_target(false);

    let result = if settings.telemetry().json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.compact().try_init()
    };

    result.map_err(|err| anyhow::anyhow!(err.to_string()))
}

/// Install the Prometheus recorder when enabled. The handle is carried on
/// `AppState` so the `/metrics` handler can render it without process-wide
/// statics.
pub(crate) fn init_metrics(settings: &Settings) -> anyhow::Result<Option<PrometheusHandle>> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(Some(handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_caps_noisy_dependencies() {
        let rendered = default_filter("debug").to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("sqlx=warn"));
        assert!(rendered.contains("reqwest=warn"));
    }
}
