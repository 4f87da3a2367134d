use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::ViewerError;

pub fn parse_filter(directives: &str) -> Result<EnvFilter, ViewerError> {
    EnvFilter::try_new(directives)
        .map_err(|e| ViewerError::Config(format!("log_filter {directives:?}: {e}")))
}

/// Install the global subscriber. Later calls are no-ops.
///
/// On wasm32 events go to the browser console; natively they go to stderr.
pub fn init(directives: &str) -> Result<(), ViewerError> {
    let filter = parse_filter(directives)?;
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(target_arch = "wasm32")]
    let result = registry
        .with(tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfig::default(),
        ))
        .try_init();

    #[cfg(not(target_arch = "wasm32"))]
    let result = registry
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .try_init();

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{init, parse_filter};
    use crate::error::ViewerError;

    #[test]
    fn accepts_level_and_target_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("warn,scene=debug").is_ok());
    }

    #[test]
    fn rejects_unknown_levels() {
        assert!(matches!(
            parse_filter("scene=loud"),
            Err(ViewerError::Config(_))
        ));
    }

    #[test]
    fn init_twice_is_harmless() {
        assert!(init("info").is_ok());
        assert!(init("debug").is_ok());
    }
}
