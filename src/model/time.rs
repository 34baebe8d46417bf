use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A point in time as epoch milliseconds.
///
/// Conflict resolution compares these numerically, never as strings.
/// Epoch zero means "never written" (missing or empty `updatedAt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub fn now() -> Self {
        Timestamp(Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    pub fn is_epoch(self) -> bool {
        self.0 == 0
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Parse an RFC 3339 string (`2026-03-01T09:00:00.000Z`).
    pub fn parse(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Timestamp(dt.timestamp_millis()))
    }

    /// The local calendar day this instant falls on.
    pub fn local_date(self) -> NaiveDate {
        self.to_datetime().with_timezone(&chrono::Local).date_naive()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.to_datetime().to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp, epoch milliseconds, or an empty string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
        if v.is_empty() {
            return Ok(Timestamp::EPOCH);
        }
        Timestamp::parse(v).ok_or_else(|| E::custom(format!("invalid timestamp: {v:?}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
        Ok(Timestamp(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
        i64::try_from(v)
            .map(Timestamp)
            .map_err(|_| E::custom("timestamp out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Timestamp, E> {
        Ok(Timestamp(v as i64))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Timestamp, E> {
        Ok(Timestamp::EPOCH)
    }

    fn visit_none<E: de::Error>(self) -> Result<Timestamp, E> {
        Ok(Timestamp::EPOCH)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Timestamp, D::Error> {
        d.deserialize_any(TimestampVisitor)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// Whole days from `today` until `due` (negative when overdue).
pub fn days_until(today: NaiveDate, due: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Short relative label for a due date: `D-3`, `today`, `D+2`.
pub fn d_day_label(today: NaiveDate, due: NaiveDate) -> String {
    match days_until(today, due) {
        0 => "today".to_string(),
        d if d > 0 => format!("D-{}", d),
        d => format!("D+{}", -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_rfc3339_millis() {
        let ts = Timestamp::from_millis(1_772_355_600_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2026-03-01T09:00:00.000Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn empty_and_null_mean_epoch() {
        let a: Timestamp = serde_json::from_str("\"\"").unwrap();
        let b: Timestamp = serde_json::from_str("null").unwrap();
        assert!(a.is_epoch());
        assert!(b.is_epoch());
    }

    #[test]
    fn accepts_integer_millis() {
        let ts: Timestamp = serde_json::from_str("1500").unwrap();
        assert_eq!(ts.as_millis(), 1500);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
    }

    #[test]
    fn ordering_is_numeric() {
        let earlier = Timestamp::parse("2026-03-01T09:00:00.000Z").unwrap();
        let later = Timestamp::parse("2026-03-01T10:00:00+01:00").unwrap();
        // Same instant expressed in two offsets
        assert_eq!(earlier, later);
        assert!(Timestamp::parse("2026-03-02T00:00:00Z").unwrap() > earlier);
    }

    #[test]
    fn d_day_labels() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(d_day_label(today, today), "today");
        assert_eq!(
            d_day_label(today, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()),
            "D-3"
        );
        assert_eq!(
            d_day_label(today, NaiveDate::from_ymd_opt(2026, 2, 27).unwrap()),
            "D+2"
        );
    }
}
