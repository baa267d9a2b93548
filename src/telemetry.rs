//! Tracing subscriber setup for embedding binaries and tests.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Installs the global tracing subscriber, once.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. With `json` set
/// the subscriber emits one JSON object per line for log shippers;
/// otherwise it writes the human-readable format.
///
/// Safe to call from multiple tests or entry points; only the first call
/// installs anything.
pub fn init(json: bool) {
    INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        init(false);
        init(true);
    }
}
