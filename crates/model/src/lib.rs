//! Telemetry model shared by the decoder, the analytics pipeline and the dump writer.

mod param;

pub use param::{ParamId, ParamValue, ParseParamError};

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One value per wheel, front-left first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corners<T> {
    pub fl: T,
    pub fr: T,
    pub rl: T,
    pub rr: T,
}

impl<T> Corners<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Corners<U> {
        Corners { fl: f(self.fl), fr: f(self.fr), rl: f(self.rl), rr: f(self.rr) }
    }
}

/// A single decoded "Data Out" packet. Fields missing from the active
/// packet format stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub is_race_on: bool,
    pub timestamp_ms: u32,

    pub engine_max_rpm: f32,
    pub engine_idle_rpm: f32,
    pub current_engine_rpm: f32,

    // car-local space, m/s^2, m/s, rad/s
    pub acceleration: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,

    pub norm_suspension_travel: Corners<f32>, // 0 = max stretch, 1 = max compression
    pub tire_slip_ratio: Corners<f32>,
    pub wheel_rotation_speed: Corners<f32>, // rad/s
    pub wheel_on_rumble_strip: Corners<i32>,
    pub wheel_in_puddle: Corners<f32>,
    pub surface_rumble: Corners<f32>,
    pub tire_slip_angle: Corners<f32>,
    pub tire_combined_slip: Corners<f32>,
    pub suspension_travel_meters: Corners<f32>,

    pub car_ordinal: i32,
    pub car_class: i32,
    pub car_performance_index: i32,
    pub drivetrain_type: i32, // 0 FWD, 1 RWD, 2 AWD
    pub num_cylinders: i32,

    pub position: Vec3,
    pub speed: f32, // m/s
    pub power: f32, // W
    pub torque: f32, // Nm
    pub tire_temp: Corners<f32>, // degrees F as sent by the game
    pub boost: f32,
    pub fuel: f32, // 0..1
    pub distance_traveled: f32,
    pub best_lap_time: f32,
    pub last_lap_time: f32,
    pub current_lap_time: f32,
    pub current_race_time: f32,

    pub lap_number: u16,
    pub race_position: u8,
    pub accel: u8, // 0..255
    pub brake: u8, // 0..255
    pub clutch: u8,
    pub handbrake: u8,
    pub gear: u8, // 0 = reverse
    pub steer: i8,
    pub norm_driving_line: i8,
    pub norm_ai_brake_diff: i8,

    pub tire_wear: Corners<f32>, // 0..1
    pub track_ordinal: i32,
}

/// Positional layouts understood by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketFormat {
    Sled,
    Fm7Dash,
    /// Forza Motorsport (2023): FM7 dash plus tire wear and track ordinal.
    #[default]
    Dash,
    /// Forza Horizon 4/5: dash block shifted by 12 bytes.
    Fh4,
}

impl PacketFormat {
    pub const ALL: [PacketFormat; 4] =
        [PacketFormat::Sled, PacketFormat::Fm7Dash, PacketFormat::Dash, PacketFormat::Fh4];

    /// Minimum datagram length for this layout.
    pub fn packet_len(self) -> usize {
        match self {
            PacketFormat::Sled => 232,
            PacketFormat::Fm7Dash => 311,
            PacketFormat::Dash => 331,
            PacketFormat::Fh4 => 324,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PacketFormat::Sled => "sled",
            PacketFormat::Fm7Dash => "fm7_dash",
            PacketFormat::Dash => "dash",
            PacketFormat::Fh4 => "fh4",
        }
    }
}

impl fmt::Display for PacketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown packet format `{0}` (expected sled, fm7_dash, dash or fh4)")]
pub struct ParseFormatError(pub String);

impl FromStr for PacketFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PacketFormat::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

/// One sample of a lap trace: metres into the lap and seconds into the lap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LapTracePoint {
    pub distance: f64,
    pub time: f64,
}

impl LapTracePoint {
    pub fn new(distance: f64, time: f64) -> Self { Self { distance, time } }
}
