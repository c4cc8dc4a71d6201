use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Format an instant as RFC 3339 (UTC for values from `now_utc`).
pub fn rfc3339(at: OffsetDateTime) -> String {
    // Rfc3339 only fails for offsets with seconds or years outside 0..=9999.
    at.format(&Rfc3339).unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn now_rfc3339() -> String {
    rfc3339(OffsetDateTime::now_utc())
}

/// Unix milliseconds, clamped at zero for pre-epoch instants.
pub fn unix_millis(at: OffsetDateTime) -> u64 {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_round_trips_through_parse() {
        let now = OffsetDateTime::now_utc();
        let s = rfc3339(now);
        let parsed = OffsetDateTime::parse(&s, &Rfc3339).unwrap();
        assert_eq!(parsed.unix_timestamp(), now.unix_timestamp());
    }

    #[test]
    fn unix_millis_of_known_instant() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(unix_millis(at), 1_700_000_000_000);
    }

    #[test]
    fn unix_millis_before_epoch_is_zero() {
        let at = OffsetDateTime::from_unix_timestamp(-5).unwrap();
        assert_eq!(unix_millis(at), 0);
    }
}
