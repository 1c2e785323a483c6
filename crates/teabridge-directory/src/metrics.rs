//! Metric names and recording helpers
//!
//! Exported through whatever `metrics` recorder the process installs.

use metrics::{counter, gauge, histogram};
use std::time::Duration;
use teabridge_core::ResultCode;

/// Metric names
pub mod names {
    pub const INFO: &str = "teabridge_info";

    // LDAP operations
    pub const BIND_TOTAL: &str = "teabridge_bind_total";
    pub const SEARCH_TOTAL: &str = "teabridge_search_total";
    pub const LDAP_CONNECTIONS: &str = "teabridge_ldap_connections";

    // Snapshot cache
    pub const SNAPSHOT_CACHE_HITS_TOTAL: &str = "teabridge_snapshot_cache_hits_total";
    pub const SNAPSHOT_CACHE_MISSES_TOTAL: &str = "teabridge_snapshot_cache_misses_total";
    pub const SNAPSHOT_BUILDS_TOTAL: &str = "teabridge_snapshot_builds_total";
    pub const SNAPSHOT_BUILD_DURATION_SECONDS: &str = "teabridge_snapshot_build_duration_seconds";
    pub const SNAPSHOT_ENTRIES: &str = "teabridge_snapshot_entries";
}

pub fn record_build_info(version: &'static str) {
    gauge!(names::INFO, "version" => version).set(1.0);
}

pub fn record_bind(code: ResultCode) {
    counter!(names::BIND_TOTAL, "result" => code.as_str()).increment(1);
}

pub fn record_search(code: ResultCode) {
    counter!(names::SEARCH_TOTAL, "result" => code.as_str()).increment(1);
}

pub fn record_cache_hit() {
    counter!(names::SNAPSHOT_CACHE_HITS_TOTAL).increment(1);
}

pub fn record_cache_miss() {
    counter!(names::SNAPSHOT_CACHE_MISSES_TOTAL).increment(1);
}

pub fn record_snapshot_build(elapsed: Duration, entries: usize) {
    counter!(names::SNAPSHOT_BUILDS_TOTAL).increment(1);
    histogram!(names::SNAPSHOT_BUILD_DURATION_SECONDS).record(elapsed.as_secs_f64());
    gauge!(names::SNAPSHOT_ENTRIES).set(entries as f64);
}

pub fn connection_opened() {
    gauge!(names::LDAP_CONNECTIONS).increment(1.0);
}

pub fn connection_closed() {
    gauge!(names::LDAP_CONNECTIONS).decrement(1.0);
}
