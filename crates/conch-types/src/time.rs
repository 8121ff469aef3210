//! Wall-clock time service.

use std::fmt;

use chrono::{Datelike, Local, Timelike};

use crate::error::Result;

/// A simple wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl WallTime {
    /// `[HH:MM:SS:ff]` prefix used for timestamped log lines.
    ///
    /// `ff` is the first two digits of the zero-padded millisecond count,
    /// so 7 ms renders `07` and 450 ms renders `45`.
    pub fn log_stamp(&self) -> String {
        let millis = format!("{:02}", self.millisecond);
        format!(
            "[{:02}:{:02}:{:02}:{}]",
            self.hour,
            self.minute,
            self.second,
            &millis[..2]
        )
    }

    /// `YYYY/MM/DD`.
    pub fn date_string(&self) -> String {
        format!("{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }

    /// `HH:MM:SS`.
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second,
        )
    }
}

/// Abstraction over the host clock.
pub trait TimeService {
    /// Current wall-clock time.
    fn now(&self) -> Result<WallTime>;
}

/// Local time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl TimeService for LocalClock {
    fn now(&self) -> Result<WallTime> {
        let now = Local::now();
        Ok(WallTime {
            year: now.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: now.month() as u8,
            day: now.day() as u8,
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second() as u8,
            // Leap seconds report 1000..=1999.
            millisecond: (now.timestamp_subsec_millis() % 1000) as u16,
        })
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub WallTime);

impl TimeService for FixedClock {
    fn now(&self) -> Result<WallTime> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(millisecond: u16) -> WallTime {
        WallTime {
            year: 2026,
            month: 10,
            day: 4,
            hour: 9,
            minute: 5,
            second: 3,
            millisecond,
        }
    }

    #[test]
    fn log_stamp_pads_fields() {
        assert_eq!(sample(7).log_stamp(), "[09:05:03:07]");
    }

    #[test]
    fn log_stamp_keeps_leading_millis_digits() {
        assert_eq!(sample(450).log_stamp(), "[09:05:03:45]");
        assert_eq!(sample(45).log_stamp(), "[09:05:03:45]");
        assert_eq!(sample(999).log_stamp(), "[09:05:03:99]");
    }

    #[test]
    fn date_and_time_strings() {
        let t = sample(0);
        assert_eq!(t.date_string(), "2026/10/04");
        assert_eq!(t.time_string(), "09:05:03");
        assert_eq!(t.to_string(), "2026-10-04 09:05:03");
    }

    #[test]
    fn local_clock_is_sane() {
        let t = LocalClock.now().unwrap();
        assert!(t.year >= 2024);
        assert!((1..=12).contains(&t.month));
        assert!((1..=31).contains(&t.day));
        assert!(t.millisecond < 1000);
    }

    #[test]
    fn fixed_clock_returns_its_instant() {
        let clock = FixedClock(sample(12));
        assert_eq!(clock.now().unwrap(), sample(12));
    }
}
