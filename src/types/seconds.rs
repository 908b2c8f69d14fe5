//! Second-based rounding and clock formatting.

/// Tolerance used when deciding whether a segment matched or beat its best.
pub const GOLD_TOLERANCE: f64 = 0.001;

/// Round to two decimal places, half away from zero.
///
/// Applied to the binary value scaled by 100, so `0.125` becomes `0.13` but a
/// value such as `1.005` (stored as `1.00499..`) becomes `1.0`.
pub fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Options for [`format_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormat {
    /// Fractional digits: 0, 1 or 2 (anything larger is treated as 2).
    pub decimals: u8,
    /// Always emit a `+`/`-` prefix.
    pub show_sign: bool,
    pub strip_leading_zero: bool,
    /// Compact delta layout: drops the minutes field under one minute.
    pub delta: bool,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self { decimals: 2, show_sign: false, strip_leading_zero: false, delta: false }
    }
}

impl TimeFormat {
    pub fn with_decimals(decimals: u8) -> Self {
        Self { decimals, ..Self::default() }
    }

    pub fn delta() -> Self {
        Self { decimals: 1, show_sign: true, strip_leading_zero: true, delta: true }
    }
}

/// Format seconds as `MM:SS.hh` or `HH:MM:SS.hh`.
pub fn format_time(seconds: f64, fmt: TimeFormat) -> String {
    if seconds == 0.0 && !fmt.show_sign {
        return match fmt.decimals {
            0 => "00:00".to_string(),
            1 => "00:00.0".to_string(),
            _ => "00:00.00".to_string(),
        };
    }

    let mut prefix = "";
    let mut value = seconds;
    if fmt.show_sign {
        // Anything within a millisecond of zero renders as a loss.
        prefix = if value > GOLD_TOLERANCE { "+" } else { "-" };
        value = value.abs();
    } else if value < 0.0 {
        prefix = "-";
        value = value.abs();
    }

    let hrs = (value / 3600.0).floor() as u64;
    let mins = ((value % 3600.0) / 60.0).floor() as u64;
    let secs = value % 60.0;

    let sec_str = match fmt.decimals {
        0 => format!("{:02}", secs.trunc() as u64),
        1 => format!("{:04.1}", secs),
        _ => format!("{:05.2}", secs),
    };

    let mut time_str = if hrs > 0 {
        format!("{:02}:{:02}:{}", hrs, mins, sec_str)
    } else if fmt.delta && mins < 1 {
        sec_str
    } else {
        format!("{:02}:{}", mins, sec_str)
    };

    if fmt.strip_leading_zero {
        let strip = if fmt.delta { mins == 0 || hrs == 0 } else { true };
        if strip && time_str.starts_with('0') {
            time_str.remove(0);
        }
    }

    format!("{}{}", prefix, time_str)
}

/// Format a comparison delta, e.g. `+1:15.0` or `-2.3`.
pub fn format_delta(seconds: f64) -> String {
    format_time(seconds, TimeFormat::delta())
}
