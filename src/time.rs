//! UTC time utilities.
//!
//! The identity host expresses every timestamp (key creation, expiration,
//! token lifetimes) as Unix milliseconds, so that is the only unit used
//! throughout the crate.

/// Returns the current Unix timestamp in milliseconds.
pub fn now_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Milliseconds in one hour, the default ephemeral-key lifetime.
pub const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_millis_is_reasonable() {
        let ts = now_timestamp_millis();
        // Should be after 2024-01-01 in millis
        assert!(ts > 1_704_067_200_000, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 in millis
        assert!(ts < 4_102_444_800_000, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_one_hour_constant() {
        assert_eq!(MILLIS_PER_HOUR, 3_600_000);
    }
}
