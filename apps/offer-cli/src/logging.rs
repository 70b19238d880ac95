//! Subscriber setup: stderr always, plus an optional log file in the output directory.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn log_file_name(timestamp: &str) -> String {
    format!("kp_generator_{timestamp}.log")
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
/// Returns the log file path when one was opened.
pub fn init_tracing(log_dir: Option<&Path>, timestamp: &str) -> anyhow::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, path) = match log_dir {
        Some(dir) => {
            let path = dir.join(log_file_name(timestamp));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_file_name() {
        assert_eq!(log_file_name("20240101_120000"), "kp_generator_20240101_120000.log");
    }
}
