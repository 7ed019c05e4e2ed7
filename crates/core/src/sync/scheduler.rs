//! Scheduler constants for the background sync loop.

/// Periodic pass cadence in seconds.
pub const SYNC_FOREGROUND_INTERVAL_SECS: u64 = 45;

/// Maximum jitter (seconds) added to periodic pass intervals.
pub const SYNC_INTERVAL_JITTER_SECS: u64 = 5;

/// Upper bound on outbox entries drained per pass.
pub const OUTBOX_PUSH_BATCH_LIMIT: i64 = 500;
