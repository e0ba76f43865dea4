//! Sexagesimal angle parsing and conversion.
//!
//! Right ascensions, declinations and the astronomical constants in the
//! star catalog are written as hour- or degree-based sexagesimal strings.
//! Both forms convert through a single circle-fraction path so hour and
//! degree readings of the same physical angle stay consistent.

use std::f64::consts::PI;

const DEGREE_MARKS: [char; 3] = ['°', 'd', 'D'];
const HOUR_MARKS: [char; 2] = ['h', 'H'];
const MINUTE_MARKS: [char; 4] = ['′', '\'', 'm', 'M'];
const SECOND_MARKS: [char; 4] = ['″', '"', 's', 'S'];

/// A signed sexagesimal angle, either hour-based (24 per circle) or
/// degree-based (360 per circle).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Angle {
    Hours { sign: f64, hours: f64, minutes: f64, seconds: f64 },
    Degrees { sign: f64, degrees: f64, minutes: f64, seconds: f64 },
}

impl Angle {
    /// Parse a sexagesimal string such as `"23° 26′ 21.406″"` or
    /// `"1h 30m 31s"`. ASCII markers (`d`, `m`, `s`, `'`, `"`) and the
    /// Unicode degree/prime/double-prime glyphs are both accepted, as is
    /// the older style with the fraction after the seconds marker
    /// (`21″.406`). A string with neither a degree nor an hour marker is
    /// an error.
    pub fn parse(text: &str) -> Result<Angle, String> {
        let mut s = text.trim();
        let mut sign = 1.0;
        if let Some(rest) = s.strip_prefix('-') {
            sign = -1.0;
            s = rest.trim_start();
        }

        let (body, frac_text) = split_at_marker(s, &SECOND_MARKS);
        let fractional = parse_component(frac_text, "fractional seconds", text)?;
        let (body, sec_text) = split_at_marker(body, &MINUTE_MARKS);
        let seconds = parse_component(sec_text, "seconds", text)? + fractional;

        if body.contains(&DEGREE_MARKS[..]) {
            let (deg_text, min_text) = split_at_marker(body, &DEGREE_MARKS);
            let minutes = parse_component(min_text, "minutes", text)?;
            let degrees = parse_required(deg_text, "degrees", text)?;
            Ok(Angle::Degrees { sign, degrees, minutes, seconds })
        } else if body.contains(&HOUR_MARKS[..]) {
            let (hour_text, min_text) = split_at_marker(body, &HOUR_MARKS);
            let minutes = parse_component(min_text, "minutes", text)?;
            let hours = parse_required(hour_text, "hours", text)?;
            Ok(Angle::Hours { sign, hours, minutes, seconds })
        } else {
            Err(format!("no degree or hour marker in angle '{}'", text.trim()))
        }
    }

    /// Signed fraction of a full circle. Shared by both conversions.
    fn circle_fraction(&self) -> f64 {
        match *self {
            Angle::Hours { sign, hours, minutes, seconds } => {
                sign * (hours + (minutes + seconds / 60.0) / 60.0) / 24.0
            }
            Angle::Degrees { sign, degrees, minutes, seconds } => {
                sign * (degrees + (minutes + seconds / 60.0) / 60.0) / 360.0
            }
        }
    }

    pub fn to_radians(&self) -> f64 {
        self.circle_fraction() * 2.0 * PI
    }

    pub fn to_degrees(&self) -> f64 {
        self.circle_fraction() * 360.0
    }
}

fn split_at_marker<'a>(s: &'a str, markers: &[char]) -> (&'a str, &'a str) {
    match s.char_indices().find(|(_, c)| markers.contains(c)) {
        Some((i, c)) => (&s[..i], s[i + c.len_utf8()..].trim_start()),
        None => (s, ""),
    }
}

fn parse_component(part: &str, what: &str, whole: &str) -> Result<f64, String> {
    let part = part.trim();
    if part.is_empty() {
        return Ok(0.0);
    }
    part.parse::<f64>()
        .map_err(|_| format!("invalid {what} '{part}' in angle '{whole}'"))
}

fn parse_required(part: &str, what: &str, whole: &str) -> Result<f64, String> {
    let part = part.trim();
    if part.is_empty() {
        return Err(format!("missing {what} in angle '{whole}'"));
    }
    part.parse::<f64>()
        .map_err(|_| format!("invalid {what} '{part}' in angle '{whole}'"))
}

/// Reduce a value into `[0, period)`. Correct for inputs arbitrarily many
/// periods away in either direction.
pub fn unwind(value: f64, period: f64) -> f64 {
    value.rem_euclid(period)
}

pub fn unwind_degrees(value: f64) -> f64 {
    unwind(value, 360.0)
}

/// Sine of an angle given in degrees, wrapped before conversion so large
/// series arguments do not lose precision.
pub fn sin_deg(degrees: f64) -> f64 {
    unwind_degrees(degrees).to_radians().sin()
}

/// Cosine of an angle given in degrees, wrapped like [`sin_deg`].
pub fn cos_deg(degrees: f64) -> f64 {
    unwind_degrees(degrees).to_radians().cos()
}
