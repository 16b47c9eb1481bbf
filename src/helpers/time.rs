use chrono::Utc;
use std::time::Duration;

/// Longest TTL ever served. Also keeps a garbage provider expiry from
/// producing a Duration that overflows `Instant` arithmetic.
pub const TTL_CEILING: Duration = Duration::from_secs(24 * 60 * 60);

pub fn now_u64() -> u64 {
    now_i64().max(0) as u64
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

/// Cache TTL for a provider token: time to expiry minus the safety buffer,
/// never below the configured floor (a near-expired token must not trigger
/// an immediate re-fetch loop) and never above [`TTL_CEILING`].
pub fn effective_ttl(
    expires_at_unix: u64,
    now_unix: u64,
    safety_buffer: Duration,
    floor: Duration,
) -> Duration {
    let remaining = expires_at_unix.saturating_sub(now_unix);
    let ttl = remaining.saturating_sub(safety_buffer.as_secs());
    Duration::from_secs(ttl.max(floor.as_secs()).min(TTL_CEILING.as_secs()))
}
