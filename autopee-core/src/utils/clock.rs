use time::macros::offset;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Offset of the timestamps banks report through SePay (Vietnam, UTC+7).
pub const BANK_UTC_OFFSET: UtcOffset = offset!(+7);

/// Current UTC time without offset, the representation stored in the database.
pub fn utc_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub fn unix(t: PrimitiveDateTime) -> i64 {
    t.assume_utc().unix_timestamp()
}

/// Unix timestamp of a bank-local transaction date.
pub fn bank_unix(t: PrimitiveDateTime) -> i64 {
    t.assume_offset(BANK_UTC_OFFSET).unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_bank_time_is_seven_hours_ahead() {
        let t = datetime!(2023-03-25 14:02:37);
        assert_eq!(unix(t) - bank_unix(t), 7 * 3600);
    }
}
