//! Shared-state constants and timing bounds.

/// File name of the shared state namespace inside the shared directory.
pub const SHARED_STATE_FILE: &str = "shared_state.json";

/// Default remote endpoint base.
pub const DEFAULT_API_BASE_URL: &str = "https://api.linksync.app";

// =============================================================================
// TIMING BOUNDS
// =============================================================================
//
// Every wait in the core is bounded: a polled condition that never becomes
// true fails with Timeout instead of hanging.

/// Sleep between session-settle poll iterations.
pub const SESSION_POLL_INTERVAL_MS: u64 = 100;

/// Maximum total time to wait for a session check to settle.
pub const SESSION_SETTLE_TIMEOUT_MS: u64 = 10_000;

/// Outbound HTTP request timeout.
pub const REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Sleep between shared-state lock acquisition attempts.
pub const STORE_LOCK_RETRY_INTERVAL_MS: u64 = 2;

/// Maximum lock acquisition attempts for a shared-state update before the
/// operation gives up with Timeout.
pub const STORE_LOCK_MAX_ATTEMPTS: u32 = 64;
