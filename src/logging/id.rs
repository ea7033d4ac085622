//! Log record identifiers.
//!
//! Ids look like `log-1718031234567-k3j9x0a2b`: the creation time in unix
//! milliseconds followed by a random lowercase alphanumeric suffix, so ids
//! sort roughly by time and stay unique within a millisecond.

use chrono::{DateTime, Utc};
use rand::Rng;

const PREFIX: &str = "log";
const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a log id anchored at `now`.
pub fn generate_at(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}-{}-{}", PREFIX, now.timestamp_millis(), suffix)
}

/// Check that `id` has the `log-<digits>-<alphanumerics>` shape.
pub fn is_well_formed(id: &str) -> bool {
    let mut parts = id.splitn(3, '-');
    let (Some(prefix), Some(millis), Some(suffix)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    prefix == PREFIX
        && !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
}
