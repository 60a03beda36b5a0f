//! Wall-clock timestamps for log records.
//!
//! Records carry UTC timestamps at 100-nanosecond resolution ("ticks"). The
//! binary format stores them as a signed 64-bit tick count since
//! 0001-01-01T00:00:00Z, with the top two bits holding a clock-kind flag.

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::{Error, Result};

/// Ticks per second; one tick is 100 ns.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Tick count of 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Kind flag marking a binary timestamp as UTC.
const KIND_UTC: i64 = 1 << 62;
/// Mask selecting the tick count out of a binary timestamp.
const TICKS_MASK: i64 = (1 << 62) - 1;

const NANOS_PER_TICK: i64 = 100;

/// Returns the current UTC time, truncated to tick resolution.
pub fn now() -> DateTime<Utc> {
    truncate(Utc::now())
}

/// Drops sub-tick precision so the timestamp survives a binary round trip.
pub fn truncate(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(7)
}

/// Converts a timestamp to ticks since 0001-01-01T00:00:00Z.
///
/// Returns `None` for timestamps the binary form cannot hold: anything before
/// year 1 or past the 62-bit tick range (around year 14600).
pub fn to_ticks(timestamp: DateTime<Utc>) -> Option<i64> {
    let sub_ticks = i64::from(timestamp.timestamp_subsec_nanos()) / NANOS_PER_TICK;
    timestamp
        .timestamp()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(UNIX_EPOCH_TICKS)?
        .checked_add(sub_ticks)
        .filter(|ticks| (0..=TICKS_MASK).contains(ticks))
}

/// Converts ticks since 0001-01-01T00:00:00Z back to a timestamp.
pub fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let relative = ticks.checked_sub(UNIX_EPOCH_TICKS)?;
    let seconds = relative.div_euclid(TICKS_PER_SECOND);
    let nanos = relative.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
}

/// Encodes a timestamp in the 64-bit binary form used by the record codec, or
/// `None` if it is out of tick range.
pub fn to_binary(timestamp: DateTime<Utc>) -> Option<i64> {
    to_ticks(timestamp).map(|ticks| ticks | KIND_UTC)
}

/// Decodes the 64-bit binary form. The kind bits are ignored; every stored
/// timestamp is read as UTC.
pub fn from_binary(value: i64) -> Result<DateTime<Utc>> {
    let ticks = value & TICKS_MASK;
    from_ticks(ticks)
        .ok_or_else(|| Error::MalformedRecord(format!("timestamp {ticks} is out of range")))
}
