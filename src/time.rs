//! Simulation time and Earth rotation.
//!
//! All ephemeris math runs on a single time value: fractional Julian days
//! since the J2000 epoch (2000-01-01 12:00 UTC). This module converts
//! calendar instants to that count and derives Greenwich Mean Sidereal
//! Time from it.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::angle::unwind;

pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const SECONDS_PER_DAY: f64 = 86400.0;
/// Julian day number of the J2000 epoch.
pub const J2000_JULIAN_DAY: f64 = 2451545.0;

const GMST_BASE_SECONDS: f64 = 67310.54841;
const GMST_SECONDS_PER_CENTURY: f64 = 876600.0 * 3600.0 + 8640184.812866;
const GMST_T2_COEFF: f64 = 0.093104;
const GMST_T3_COEFF: f64 = 6.2e-6;

/// Days since J2000 noon for a UTC calendar date and time of day.
///
/// Integer part per the Fliegel–Van Flandern day-count identity, offset by
/// 730531.5 so zero lands on the epoch; fractional part from the clock.
pub fn to_julian_day(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> f64 {
    let y = year as f64;
    let m = month as f64;
    let d = day as f64;
    let h = hour as f64 + (minute as f64 / 60.0) + (second / 3600.0);
    367.0 * y - (7.0 * (y + ((m + 9.0) / 12.0).floor()) / 4.0).floor()
        + (275.0 * m / 9.0).floor()
        + d
        - 730531.5
        + h / 24.0
}

/// Days since J2000 noon for a chrono UTC instant.
pub fn julian_day_from_utc(when: DateTime<Utc>) -> f64 {
    let second = when.second() as f64 + when.nanosecond() as f64 * 1.0e-9;
    to_julian_day(when.year(), when.month(), when.day(), when.hour(), when.minute(), second)
}

/// Greenwich Mean Sidereal Time in degrees, `[0, 360)`.
///
/// Julian-century polynomial in seconds of sidereal time, reduced modulo
/// one day and then divided by 240 seconds per degree.
pub fn gmst_degrees(julian_day: f64) -> f64 {
    let jc = julian_day / DAYS_PER_JULIAN_CENTURY;
    let gmst = GMST_BASE_SECONDS
        + GMST_SECONDS_PER_CENTURY * jc
        + GMST_T2_COEFF * jc * jc
        - GMST_T3_COEFF * jc * jc * jc;
    unwind(gmst, SECONDS_PER_DAY) / 240.0
}

/// A named fixed instant selectable from the time panel.
pub struct TimePreset {
    pub label: &'static str,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl TimePreset {
    pub fn julian_day(&self) -> f64 {
        to_julian_day(self.year, self.month, self.day, self.hour, 0, 0.0)
    }
}

pub const TIME_PRESETS: [TimePreset; 2] = [
    TimePreset { label: "2016 March equinox", year: 2016, month: 3, day: 21, hour: 6 },
    TimePreset { label: "2016-10-19 07:00", year: 2016, month: 10, day: 19, hour: 7 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    Paused,
    WallClock,
    Preset(usize),
}

/// The simulation clock: a base instant plus a user offset in days.
///
/// The base tracks the wall clock (or a preset) while live, and holds
/// still while paused or while the user is dragging the offset slider,
/// so the view does not shift under the drag.
pub struct SimClock {
    pub mode: TimeMode,
    pub offset_days: f64,
    base: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self { mode: TimeMode::WallClock, offset_days: 0.0, base: 0.0 }
    }

    /// Current simulation time in days since J2000.
    pub fn sample(&mut self, now: DateTime<Utc>, dragging: bool) -> f64 {
        let live = !dragging && self.mode != TimeMode::Paused;
        if live {
            self.base = match self.mode {
                TimeMode::WallClock => julian_day_from_utc(now),
                TimeMode::Preset(i) => TIME_PRESETS[i % TIME_PRESETS.len()].julian_day(),
                TimeMode::Paused => unreachable!(),
            };
        }
        self.base + self.offset_days
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
