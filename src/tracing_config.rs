//! Subscriber setup for applications embedding the engine.
//!
//! The engine only emits `tracing` events; an application that wants them
//! calls [`init_tracing`] once at startup, before resolving its repositories:
//!
//! ```ignore
//! typeinfo::tracing_config::init_tracing();
//! let metadata = RepositoryMetadata::new(&interface, &repository_root)?;
//! ```
//!
//! Nothing is installed unless `TYPEINFO_LOG` (or `RUST_LOG`) is set. Useful
//! filters:
//!
//! - `typeinfo_solver=debug`: degraded resolutions (variables falling back
//!   to their bounds, cut cycles, swept cache entries)
//! - `typeinfo_solver::cache=trace`: every cache hit and miss
//! - `typeinfo::query_json=trace`: structured query events only, best read
//!   with `TYPEINFO_LOG_FORMAT=json`
//!
//! `TYPEINFO_LOG_FORMAT` selects `text` (default), `tree` (`tracing-tree`)
//! or `json`. Output goes to stderr.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively. Unknown names select `Text`.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("TYPEINFO_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `TYPEINFO_LOG`, falling back to `RUST_LOG`.
///
/// `TYPEINFO_LOG` takes precedence when both are set. Values use the same
/// syntax as `RUST_LOG` (e.g. `debug`, `typeinfo_solver=trace`).
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("TYPEINFO_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        // RUST_LOG is set (caller already checked).
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `TYPEINFO_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr. A subscriber installed earlier by the host application is
/// left in place.
pub fn init_tracing() {
    let has_typeinfo_log = std::env::var("TYPEINFO_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_typeinfo_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    let installed = match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);

            Registry::default().with(filter).with(text_layer).try_init()
        }
    };

    if installed.is_err() {
        tracing::debug!("a global tracing subscriber is already installed");
    }
}
