use error_stack::Report;
use thiserror::Error;
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::FormatTime, MakeWriter},
    layer::SubscriberExt,
    EnvFilter, Registry,
};

/// The error returned when tracing setup fails
#[derive(Error, Debug)]
#[error("Failed to configure tracing")]
pub struct TraceConfigureError;

/// Install the global tracing subscriber. The filter is read from `{env_prefix}LOG`, and
/// defaults to `info`.
pub fn configure_tracing<FT, W>(
    env_prefix: &str,
    timer: FT,
    writer: W,
) -> Result<(), Report<TraceConfigureError>>
where
    FT: FormatTime + Send + Sync + 'static,
    for<'writer> W: MakeWriter<'writer> + Send + Sync + 'static,
{
    let env_name = format!("{env_prefix}LOG");
    let env_filter = EnvFilter::try_from_env(&env_name).unwrap_or_else(|_| EnvFilter::new("info"));

    let formatter = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW)
        .with_timer(timer)
        .with_target(true)
        .with_writer(writer);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(formatter)
        .with(ErrorLayer::default());

    set_global_default(subscriber).map_err(|_| Report::new(TraceConfigureError))
}

/// Initialize tracing from a test context
pub mod test {
    use std::sync::Once;

    use tracing_subscriber::fmt::TestWriter;

    static TRACING: Once = Once::new();

    /// Initialize tracing. This only starts tracing once per process, so it is safe to
    /// call from every test.
    pub fn init() {
        TRACING.call_once(|| {
            // Another harness may already have installed a subscriber.
            super::configure_tracing(
                "TEST_",
                tracing_subscriber::fmt::time::Uptime::default(),
                TestWriter::new(),
            )
            .ok();
        })
    }
}
