//! Structured query tracing for descriptor query entry points.
//!
//! Events use target `typeinfo::query_json` and are intended to be consumed with:
//! `TYPEINFO_LOG=typeinfo::query_json=trace TYPEINFO_LOG_FORMAT=json`.
//!
//! Environment:
//! - `TYPEINFO_QUERY_RUN_ID`: optional run identifier attached to every event.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};
use typeinfo_host::RawType;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "typeinfo::query_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| {
            std::env::var("TYPEINFO_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string())
        })
        .as_str()
}

#[inline]
pub(crate) fn cache_lookup(query_id: u64, raw: &RawType, cache_hit: bool) {
    let key = raw.key();
    trace!(
        target: "typeinfo::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op = "cache_get",
        raw_type = raw.name(),
        loader_id = key.loader.0,
        index = key.index,
        cache_hit
    );
}

#[inline]
pub(crate) fn unary_start(query_id: u64, op: &'static str, input: &str, has_context: bool) {
    trace!(
        target: "typeinfo::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        input,
        has_context
    );
}

#[inline]
pub(crate) fn unary_end(query_id: u64, op: &'static str, result: &str) {
    trace!(
        target: "typeinfo::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result
    );
}

#[inline]
pub(crate) fn relation_start(query_id: u64, op: &'static str, source: &str, target: &str) {
    trace!(
        target: "typeinfo::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        source,
        target
    );
}

#[inline]
pub(crate) fn relation_end(query_id: u64, op: &'static str, result: bool) {
    trace!(
        target: "typeinfo::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result
    );
}
