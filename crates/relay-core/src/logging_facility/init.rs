//! Subscriber installation for hosts embedding the engine

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output flavour of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable `fmt` output
    Development,
    /// One JSON object per event
    Production,
    /// No output; tests record events through
    /// [`init_test_capture`](super::init_test_capture)
    Test,
}

impl Profile {
    /// Filter directive used when `RUST_LOG` is unset or invalid
    pub fn default_filter(&self) -> &'static str {
        match self {
            Profile::Development => "relay=debug",
            Profile::Production => "relay=info",
            Profile::Test => "off",
        }
    }

    /// `RUST_LOG` if it parses, otherwise [`Profile::default_filter`]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_filter()))
    }
}

static INSTALL: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call in a process does anything. If another subscriber
/// already owns the global slot (a test capture layer, or one the host set
/// up itself) it stays in place.
pub fn init(profile: Profile) {
    INSTALL.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(profile.env_filter())
                .try_init()
                .map_err(|e| e.to_string()),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.env_filter())
                .try_init()
                .map_err(|e| e.to_string()),
            Profile::Test => tracing_subscriber::registry()
                .try_init()
                .map_err(|e| e.to_string()),
        };
        if let Err(reason) = installed {
            tracing::debug!(
                component = module_path!(),
                op = "logging_init",
                profile = ?profile,
                reason = %reason,
                "keeping existing subscriber"
            );
        }
    });
}
