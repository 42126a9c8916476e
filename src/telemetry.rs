use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Console logging options
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TelemetryOptions {
    /// [EnvFilter] directives used when `RUST_LOG` is not set,
    /// ex: `"warn,workflow_activity_core=debug"`
    #[builder(default = "\"info\".to_string()")]
    pub tracing_filter: String,
    /// Use the multi-line pretty formatter rather than the compact one
    #[builder(default = "true")]
    pub pretty: bool,
}

impl TelemetryOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(filter) = &self.tracing_filter {
            EnvFilter::try_new(filter).map_err(|e| format!("Invalid `tracing_filter`: {}", e))?;
        }
        Ok(())
    }
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            tracing_filter: "info".to_string(),
            pretty: true,
        }
    }
}

/// Initialize tracing subscribers and output. This crate never calls it itself, it exists so
/// that binaries and tests have an easy way to see what activities are doing.
///
/// The `RUST_LOG` env var takes precedence over [TelemetryOptions::tracing_filter]. Only the first
/// call has any effect.
pub fn telemetry_init(opts: &TelemetryOptions) -> Result<(), anyhow::Error> {
    TRACING_INIT.get_or_try_init(|| {
        let filter_layer = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&opts.tracing_filter))?;
        let registry = tracing_subscriber::registry().with(filter_layer);
        if opts.pretty {
            let pretty_fmt = tracing_subscriber::fmt::format()
                .pretty()
                .with_source_location(false);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .event_format(pretty_fmt),
                )
                .try_init()?;
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init()?;
        }
        Ok::<_, anyhow::Error>(())
    })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_defaults() {
        let opts = TelemetryOptionsBuilder::default().build().unwrap();
        assert_eq!(opts.tracing_filter, "info");
        assert!(opts.pretty);
    }

    #[test]
    fn builder_rejects_bad_filter() {
        let err = TelemetryOptionsBuilder::default()
            .tracing_filter("my_crate=notalevel")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tracing_filter"));
    }

    #[test]
    fn init_is_idempotent() {
        let opts = TelemetryOptions::default();
        telemetry_init(&opts).unwrap();
        telemetry_init(&opts).unwrap();
        info!("telemetry initialized");
    }
}
