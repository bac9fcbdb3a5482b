//! Conversions between typed values and their stored text form.
//!
//! Every entry is stored as a string. [`StoreValue`] defines, per type, how a
//! value is written and how stored text is read back. The type's
//! [`Default`] is its zero value: what a getter yields for a missing or
//! unparsable entry.
//!
//! # Zero-as-absent
//!
//! The `*_or` getters on [`GameData`](crate::GameData) substitute the caller's
//! fallback whenever the resolved value equals the zero value. A stored `0`,
//! `false`, empty string, epoch timestamp or zero duration is therefore
//! indistinguishable from a missing key through those getters. Use the
//! `try_get*` variants when the difference matters.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, Utc};

use crate::timespan;

/// A value type that can be kept in the store.
pub trait StoreValue: Sized + Default + PartialEq {
    /// Text written to the store.
    fn to_stored(&self) -> String;

    /// Parse stored text. `None` when the text is not a valid value.
    fn from_stored(raw: &str) -> Option<Self>;

    /// Whether this is the type's zero value.
    fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl StoreValue for bool {
    fn to_stored(&self) -> String {
        let text = if *self { "True" } else { "False" };
        text.to_string()
    }

    fn from_stored(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl StoreValue for i32 {
    fn to_stored(&self) -> String {
        self.to_string()
    }

    fn from_stored(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl StoreValue for f32 {
    fn to_stored(&self) -> String {
        self.to_string()
    }

    fn from_stored(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl StoreValue for String {
    fn to_stored(&self) -> String {
        self.clone()
    }

    fn from_stored(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl StoreValue for DateTime<Utc> {
    /// RFC 3339 in UTC, keeping all sub-second digits.
    fn to_stored(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// RFC 3339 with any offset, or `YYYY-MM-DD HH:MM:SS[.f]` read as UTC.
    fn from_stored(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl StoreValue for TimeDelta {
    fn to_stored(&self) -> String {
        timespan::format(*self)
    }

    fn from_stored(raw: &str) -> Option<Self> {
        timespan::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bool_text() {
        assert_eq!(true.to_stored(), "True");
        assert_eq!(false.to_stored(), "False");
        assert_eq!(bool::from_stored("TRUE"), Some(true));
        assert_eq!(bool::from_stored(" false "), Some(false));
        assert_eq!(bool::from_stored("1"), None);
    }

    #[test]
    fn int_text() {
        assert_eq!((-12i32).to_stored(), "-12");
        assert_eq!(i32::from_stored(" 42 "), Some(42));
        assert_eq!(i32::from_stored("4.2"), None);
        assert_eq!(i32::from_stored("99999999999"), None);
    }

    #[test]
    fn float_text() {
        assert_eq!(2.5f32.to_stored(), "2.5");
        assert_eq!(0.1f32.to_stored(), "0.1");
        assert_eq!(f32::from_stored("0.1"), Some(0.1));
        assert_eq!(f32::from_stored("1e3"), Some(1000.0));
        assert_eq!(f32::from_stored("abc"), None);
    }

    #[test]
    fn float_negative_zero_is_zero() {
        assert!((-0.0f32).is_zero());
        assert!(!f32::NAN.is_zero());
    }

    #[test]
    fn string_text_is_verbatim() {
        let s = String::from("  spaced  ");
        assert_eq!(s.to_stored(), "  spaced  ");
        assert_eq!(String::from_stored("  spaced  "), Some(s));
        assert!(String::new().is_zero());
    }

    #[test]
    fn datetime_text() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(t.to_stored(), "2024-05-01T10:00:00Z");
        assert_eq!(DateTime::<Utc>::from_stored("2024-05-01T10:00:00Z"), Some(t));
        assert_eq!(
            DateTime::<Utc>::from_stored("2024-05-01T12:00:00+02:00"),
            Some(t)
        );
        assert_eq!(DateTime::<Utc>::from_stored("2024-05-01 10:00:00"), Some(t));
        assert_eq!(DateTime::<Utc>::from_stored("yesterday"), None);
    }

    #[test]
    fn datetime_keeps_subseconds() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
            + TimeDelta::nanoseconds(123_456_789);
        assert_eq!(DateTime::<Utc>::from_stored(&t.to_stored()), Some(t));
    }

    #[test]
    fn datetime_zero_is_epoch() {
        assert!(Utc.timestamp_opt(0, 0).unwrap().is_zero());
        assert!(!Utc::now().is_zero());
    }

    #[test]
    fn time_span_text() {
        let d = TimeDelta::seconds(3_723);
        assert_eq!(d.to_stored(), "01:02:03");
        assert_eq!(TimeDelta::from_stored("01:02:03"), Some(d));
        assert_eq!(TimeDelta::from_stored("soon"), None);
        assert!(TimeDelta::zero().is_zero());
    }
}
