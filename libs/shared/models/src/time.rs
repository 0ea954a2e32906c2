use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Error, Debug, PartialEq)]
pub enum ClockParseError {
    #[error("time must be formatted as HH:MM, got '{0}'")]
    Format(String),

    #[error("time '{0}' is out of range")]
    OutOfRange(String),
}

/// A time of day normalized to minutes since midnight.
///
/// All comparisons inside the scheduler are numeric; "HH:MM" strings exist
/// only at the API boundary, where this type parses and renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockMinutes(u16);

impl ClockMinutes {
    pub const fn new(minutes: u16) -> Option<Self> {
        if minutes < MINUTES_PER_DAY {
            Some(Self(minutes))
        } else {
            None
        }
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if hours >= 24 || minutes >= 60 {
            return None;
        }
        Self::new(hours * 60 + minutes)
    }

    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Advance by `step` minutes, `None` past the end of the day.
    pub fn checked_add(self, step: u16) -> Option<Self> {
        self.0.checked_add(step).and_then(Self::new)
    }
}

impl FromStr for ClockMinutes {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| ClockParseError::Format(s.to_string()))?;
        let hours: u16 = h
            .parse()
            .map_err(|_| ClockParseError::Format(s.to_string()))?;
        let minutes: u16 = m
            .parse()
            .map_err(|_| ClockParseError::Format(s.to_string()))?;
        Self::from_hm(hours, minutes).ok_or_else(|| ClockParseError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for ClockMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for ClockMinutes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockMinutes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_renders_hh_mm() {
        let t: ClockMinutes = "09:05".parse().unwrap();
        assert_eq!(t.minutes(), 9 * 60 + 5);
        assert_eq!(t.to_string(), "09:05");

        assert_eq!("00:00".parse::<ClockMinutes>().unwrap().minutes(), 0);
        assert_eq!(
            "23:59".parse::<ClockMinutes>().unwrap().minutes(),
            MINUTES_PER_DAY - 1
        );
    }

    #[test]
    fn test_rejects_malformed_and_out_of_range_input() {
        assert_eq!(
            "0905".parse::<ClockMinutes>(),
            Err(ClockParseError::Format("0905".to_string()))
        );
        assert_eq!(
            "9:xx".parse::<ClockMinutes>(),
            Err(ClockParseError::Format("9:xx".to_string()))
        );
        assert_eq!(
            "24:00".parse::<ClockMinutes>(),
            Err(ClockParseError::OutOfRange("24:00".to_string()))
        );
        assert_eq!(
            "12:60".parse::<ClockMinutes>(),
            Err(ClockParseError::OutOfRange("12:60".to_string()))
        );
    }

    #[test]
    fn test_checked_add_stops_at_midnight() {
        let late = ClockMinutes::from_hm(23, 45).unwrap();
        assert_eq!(late.checked_add(15), None);
        assert_eq!(
            ClockMinutes::from_hm(9, 0).unwrap().checked_add(30),
            ClockMinutes::from_hm(9, 30)
        );
    }

    #[test]
    fn test_serde_round_trips_as_string() {
        let t = ClockMinutes::from_hm(14, 30).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"14:30\"");
        let back: ClockMinutes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
