/// Minutes a bus spends at each stop when the caller does not say otherwise
pub const DEFAULT_DWELL_MINUTES: u32 = 1;

/// Upper bound on in-flight travel oracle requests during matrix gathering
pub const DEFAULT_ORACLE_CONCURRENCY: usize = 8;

/// Nominatim usage policy allows one request per second
pub const DEFAULT_NOMINATIM_RATE_LIMIT_MS: u64 = 1500;
