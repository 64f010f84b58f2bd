//! Named access to every field of a [`Reading`], used for configurable
//! column lists.

use crate::{PacketFormat, Reading};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f32),
}

impl ParamValue {
    pub fn as_f64(self) -> f64 {
        match self {
            ParamValue::Bool(b) => b as u8 as f64,
            ParamValue::Int(i) => i as f64,
            ParamValue::Float(f) => f as f64,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", *b as u8),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v:.6}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self { ParamValue::Bool(v) }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self { ParamValue::Float(v) }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(v: $t) -> Self { ParamValue::Int(v as i64) }
        })*
    };
}

int_value!(u8, i8, u16, i32, u32);

macro_rules! params {
    ($($variant:ident => $name:literal, |$r:ident| $get:expr;)*) => {
        /// Every field of a [`Reading`], in wire order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ParamId {
            $($variant,)*
        }

        impl ParamId {
            pub const ALL: &'static [ParamId] = &[$(ParamId::$variant,)*];

            /// Column name as written by the dump tool and accepted in config files.
            pub fn name(self) -> &'static str {
                match self {
                    $(ParamId::$variant => $name,)*
                }
            }

            pub fn value(self, reading: &Reading) -> ParamValue {
                match self {
                    $(ParamId::$variant => {
                        let $r = reading;
                        ParamValue::from($get)
                    })*
                }
            }
        }
    };
}

params! {
    IsRaceOn => "is_race_on", |r| r.is_race_on;
    TimestampMs => "timestamp_ms", |r| r.timestamp_ms;
    EngineMaxRpm => "engine_max_rpm", |r| r.engine_max_rpm;
    EngineIdleRpm => "engine_idle_rpm", |r| r.engine_idle_rpm;
    CurrentEngineRpm => "current_engine_rpm", |r| r.current_engine_rpm;
    AccelerationX => "acceleration_x", |r| r.acceleration.x;
    AccelerationY => "acceleration_y", |r| r.acceleration.y;
    AccelerationZ => "acceleration_z", |r| r.acceleration.z;
    VelocityX => "velocity_x", |r| r.velocity.x;
    VelocityY => "velocity_y", |r| r.velocity.y;
    VelocityZ => "velocity_z", |r| r.velocity.z;
    AngularVelocityX => "angular_velocity_x", |r| r.angular_velocity.x;
    AngularVelocityY => "angular_velocity_y", |r| r.angular_velocity.y;
    AngularVelocityZ => "angular_velocity_z", |r| r.angular_velocity.z;
    Yaw => "yaw", |r| r.yaw;
    Pitch => "pitch", |r| r.pitch;
    Roll => "roll", |r| r.roll;
    NormSuspensionTravelFl => "norm_suspension_travel_FL", |r| r.norm_suspension_travel.fl;
    NormSuspensionTravelFr => "norm_suspension_travel_FR", |r| r.norm_suspension_travel.fr;
    NormSuspensionTravelRl => "norm_suspension_travel_RL", |r| r.norm_suspension_travel.rl;
    NormSuspensionTravelRr => "norm_suspension_travel_RR", |r| r.norm_suspension_travel.rr;
    TireSlipRatioFl => "tire_slip_ratio_FL", |r| r.tire_slip_ratio.fl;
    TireSlipRatioFr => "tire_slip_ratio_FR", |r| r.tire_slip_ratio.fr;
    TireSlipRatioRl => "tire_slip_ratio_RL", |r| r.tire_slip_ratio.rl;
    TireSlipRatioRr => "tire_slip_ratio_RR", |r| r.tire_slip_ratio.rr;
    WheelRotationSpeedFl => "wheel_rotation_speed_FL", |r| r.wheel_rotation_speed.fl;
    WheelRotationSpeedFr => "wheel_rotation_speed_FR", |r| r.wheel_rotation_speed.fr;
    WheelRotationSpeedRl => "wheel_rotation_speed_RL", |r| r.wheel_rotation_speed.rl;
    WheelRotationSpeedRr => "wheel_rotation_speed_RR", |r| r.wheel_rotation_speed.rr;
    WheelOnRumbleStripFl => "wheel_on_rumble_strip_FL", |r| r.wheel_on_rumble_strip.fl;
    WheelOnRumbleStripFr => "wheel_on_rumble_strip_FR", |r| r.wheel_on_rumble_strip.fr;
    WheelOnRumbleStripRl => "wheel_on_rumble_strip_RL", |r| r.wheel_on_rumble_strip.rl;
    WheelOnRumbleStripRr => "wheel_on_rumble_strip_RR", |r| r.wheel_on_rumble_strip.rr;
    WheelInPuddleFl => "wheel_in_puddle_FL", |r| r.wheel_in_puddle.fl;
    WheelInPuddleFr => "wheel_in_puddle_FR", |r| r.wheel_in_puddle.fr;
    WheelInPuddleRl => "wheel_in_puddle_RL", |r| r.wheel_in_puddle.rl;
    WheelInPuddleRr => "wheel_in_puddle_RR", |r| r.wheel_in_puddle.rr;
    SurfaceRumbleFl => "surface_rumble_FL", |r| r.surface_rumble.fl;
    SurfaceRumbleFr => "surface_rumble_FR", |r| r.surface_rumble.fr;
    SurfaceRumbleRl => "surface_rumble_RL", |r| r.surface_rumble.rl;
    SurfaceRumbleRr => "surface_rumble_RR", |r| r.surface_rumble.rr;
    TireSlipAngleFl => "tire_slip_angle_FL", |r| r.tire_slip_angle.fl;
    TireSlipAngleFr => "tire_slip_angle_FR", |r| r.tire_slip_angle.fr;
    TireSlipAngleRl => "tire_slip_angle_RL", |r| r.tire_slip_angle.rl;
    TireSlipAngleRr => "tire_slip_angle_RR", |r| r.tire_slip_angle.rr;
    TireCombinedSlipFl => "tire_combined_slip_FL", |r| r.tire_combined_slip.fl;
    TireCombinedSlipFr => "tire_combined_slip_FR", |r| r.tire_combined_slip.fr;
    TireCombinedSlipRl => "tire_combined_slip_RL", |r| r.tire_combined_slip.rl;
    TireCombinedSlipRr => "tire_combined_slip_RR", |r| r.tire_combined_slip.rr;
    SuspensionTravelMetersFl => "suspension_travel_meters_FL", |r| r.suspension_travel_meters.fl;
    SuspensionTravelMetersFr => "suspension_travel_meters_FR", |r| r.suspension_travel_meters.fr;
    SuspensionTravelMetersRl => "suspension_travel_meters_RL", |r| r.suspension_travel_meters.rl;
    SuspensionTravelMetersRr => "suspension_travel_meters_RR", |r| r.suspension_travel_meters.rr;
    CarOrdinal => "car_ordinal", |r| r.car_ordinal;
    CarClass => "car_class", |r| r.car_class;
    CarPerformanceIndex => "car_performance_index", |r| r.car_performance_index;
    DrivetrainType => "drivetrain_type", |r| r.drivetrain_type;
    NumCylinders => "num_cylinders", |r| r.num_cylinders;
    PositionX => "position_x", |r| r.position.x;
    PositionY => "position_y", |r| r.position.y;
    PositionZ => "position_z", |r| r.position.z;
    Speed => "speed", |r| r.speed;
    Power => "power", |r| r.power;
    Torque => "torque", |r| r.torque;
    TireTempFl => "tire_temp_FL", |r| r.tire_temp.fl;
    TireTempFr => "tire_temp_FR", |r| r.tire_temp.fr;
    TireTempRl => "tire_temp_RL", |r| r.tire_temp.rl;
    TireTempRr => "tire_temp_RR", |r| r.tire_temp.rr;
    Boost => "boost", |r| r.boost;
    Fuel => "fuel", |r| r.fuel;
    DistTraveled => "dist_traveled", |r| r.distance_traveled;
    BestLapTime => "best_lap_time", |r| r.best_lap_time;
    LastLapTime => "last_lap_time", |r| r.last_lap_time;
    CurLapTime => "cur_lap_time", |r| r.current_lap_time;
    CurRaceTime => "cur_race_time", |r| r.current_race_time;
    LapNo => "lap_no", |r| r.lap_number;
    RacePos => "race_pos", |r| r.race_position;
    Accel => "accel", |r| r.accel;
    Brake => "brake", |r| r.brake;
    Clutch => "clutch", |r| r.clutch;
    Handbrake => "handbrake", |r| r.handbrake;
    Gear => "gear", |r| r.gear;
    Steer => "steer", |r| r.steer;
    NormDrivingLine => "norm_driving_line", |r| r.norm_driving_line;
    NormAiBrakeDiff => "norm_ai_brake_diff", |r| r.norm_ai_brake_diff;
    TireWearFl => "tire_wear_FL", |r| r.tire_wear.fl;
    TireWearFr => "tire_wear_FR", |r| r.tire_wear.fr;
    TireWearRl => "tire_wear_RL", |r| r.tire_wear.rl;
    TireWearRr => "tire_wear_RR", |r| r.tire_wear.rr;
    TrackOrdinal => "track_ordinal", |r| r.track_ordinal;
}

const SLED_PARAMS: usize = 58;
const DASH_PARAMS: usize = 85;

impl ParamId {
    /// Fields carried by `format`, in the order they appear on the wire.
    pub fn for_format(format: PacketFormat) -> &'static [ParamId] {
        match format {
            PacketFormat::Sled => &Self::ALL[..SLED_PARAMS],
            PacketFormat::Fm7Dash | PacketFormat::Fh4 => &Self::ALL[..DASH_PARAMS],
            PacketFormat::Dash => Self::ALL,
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown telemetry parameter `{0}`")]
pub struct ParseParamError(pub String);

impl FromStr for ParamId {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ParseParamError(s.to_string()))
    }
}

impl Serialize for ParamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ParamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
