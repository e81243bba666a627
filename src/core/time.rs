use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Whole minutes between two instants, rounded to nearest.
pub(crate) fn minutes_between(start: PrimitiveDateTime, end: PrimitiveDateTime) -> i32 {
    let seconds = (end.assume_utc() - start.assume_utc()).whole_seconds();
    ((seconds as f64) / 60.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    fn at(h: u8, m: u8, s: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::March, 10).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(h, m, s).unwrap())
    }

    #[test]
    fn format_primitive_outputs_utc_z() {
        assert_eq!(format_primitive(at(10, 20, 30)), "2025-03-10T10:20:30Z");
    }

    #[test]
    fn minutes_between_rounds_to_nearest() {
        assert_eq!(minutes_between(at(10, 0, 0), at(10, 14, 29)), 14);
        assert_eq!(minutes_between(at(10, 0, 0), at(10, 14, 31)), 15);
        assert_eq!(minutes_between(at(10, 0, 0), at(10, 0, 0)), 0);
    }
}
