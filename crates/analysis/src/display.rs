//! Unit conversion and text formatting for dashboard readouts.

use delta_config::{DashConfig, Units};
use serde::Serialize;

const MPS_TO_KMH: f64 = 3.6;
const MPS_TO_MPH: f64 = 2.236936;
const M_TO_KM: f64 = 0.001;
const M_TO_MILES: f64 = 0.000_621_371_2;

/// `m:ss.mmm`, rounded to the millisecond. Negative input is shown by magnitude.
pub fn format_lap_time(seconds: f64) -> String {
    let total_ms = (seconds.abs() * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms / 1000) % 60;
    let ms = total_ms % 1000;
    format!("{minutes}:{secs:02}.{ms:03}")
}

/// Signed interval text; `-` only when ahead.
pub fn format_delta(delta: f64) -> String {
    let sign = if delta < 0.0 { '-' } else { '+' };
    format!("{sign}{}", format_lap_time(delta))
}

pub fn speed_value(speed_mps: f64, units: Units) -> i64 {
    let v = match units {
        Units::Metric => speed_mps * MPS_TO_KMH,
        Units::Imperial => speed_mps * MPS_TO_MPH,
    };
    v as i64
}

pub fn speed_unit_label(units: Units) -> &'static str {
    match units {
        Units::Metric => "km/h",
        Units::Imperial => "mph",
    }
}

pub fn format_distance(meters: f64, units: Units) -> String {
    let v = match units {
        Units::Metric => meters * M_TO_KM,
        Units::Imperial => meters * M_TO_MILES,
    };
    format!("{v:.3}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TireBand {
    Cold,
    Optimal,
    Warm,
    Hot,
}

pub fn tire_band(temp: f32, cfg: &DashConfig) -> TireBand {
    if temp <= cfg.tire_temp_blue {
        TireBand::Cold
    } else if temp >= cfg.tire_temp_red {
        TireBand::Hot
    } else if temp >= cfg.tire_temp_yellow {
        TireBand::Warm
    } else {
        TireBand::Optimal
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftLight {
    #[default]
    Normal,
    Ready,
    Shift,
}

pub fn shift_light(rpm: f32, max_rpm: f32, cfg: &DashConfig) -> ShiftLight {
    if rpm == 0.0 || max_rpm == 0.0 {
        return ShiftLight::Normal;
    }
    let ratio = f64::from(rpm / max_rpm);
    if ratio >= f64::from(cfg.redline_percent) * 0.01 {
        ShiftLight::Shift
    } else if ratio >= f64::from(cfg.ready_percent) * 0.01 {
        ShiftLight::Ready
    } else {
        ShiftLight::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LapRating {
    Unknown,
    Faster,
    Slower,
}

/// Last lap against the game's best lap.
pub fn rate_last_lap(last: f32, best: f32) -> LapRating {
    if last == 0.0 || best == 0.0 {
        LapRating::Unknown
    } else if last > best {
        LapRating::Slower
    } else {
        LapRating::Faster
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Ahead,
    Behind,
    #[default]
    Level,
}

impl Trend {
    pub fn of(delta: f64) -> Self {
        if delta < 0.0 {
            Trend::Ahead
        } else if delta > 0.0 {
            Trend::Behind
        } else {
            Trend::Level
        }
    }
}
