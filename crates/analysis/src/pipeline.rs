use crate::display::{self, LapRating, ShiftLight, TireBand, Trend};
use crate::fuel::FuelEstimator;
use crate::interval::IntervalEngine;
use crate::session::{LapEvent, SessionTracker};
use delta_config::DashConfig;
use model::{Corners, LapTracePoint, Reading};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalReadout {
    /// Seconds against the reference lap, `None` until one exists.
    pub delta: Option<f64>,
    pub text: String,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TireReadout {
    pub wear_percent: i32,
    pub temp: f32,
    pub band: TireBand,
    pub slip: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelReadout {
    pub level_percent: f64,
    pub usage_percent: Option<f64>,
    pub laps_left: Option<f64>,
    pub low: bool,
}

/// Everything a dashboard needs for one race-on tick, already converted to
/// the configured units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub event: LapEvent,
    pub lap: u16,
    pub race_position: u8,
    pub distance: String,
    pub speed: i64,
    pub speed_unit: &'static str,
    pub gear: u8,
    pub shift: ShiftLight,
    pub current_lap_time: String,
    pub last_lap_time: String,
    pub best_lap_time: String,
    pub last_lap: LapRating,
    pub interval: IntervalReadout,
    pub tires: Corners<TireReadout>,
    pub fuel: FuelReadout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub race_on: bool,
    pub snapshot: Option<Snapshot>,
}

/// Owns the analytics state for one stream. Not shared: the ingest task
/// drives it and hands snapshots out by value.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    tracker: SessionTracker,
    interval: IntervalEngine,
    fuel: FuelEstimator,
}

impl Pipeline {
    pub fn new() -> Self { Self::default() }

    pub fn tracker(&self) -> &SessionTracker { &self.tracker }
    pub fn interval(&self) -> &IntervalEngine { &self.interval }
    pub fn fuel(&self) -> &FuelEstimator { &self.fuel }

    /// Readings with the race off leave all state untouched.
    pub fn process(&mut self, reading: &Reading, cfg: &DashConfig) -> Tick {
        if !reading.is_race_on {
            return Tick { race_on: false, snapshot: None };
        }

        let event = self.tracker.observe(reading);
        let point = LapTracePoint::new(
            self.tracker.lap_distance(reading),
            f64::from(reading.current_lap_time),
        );
        let delta = self.interval.update(event, point, f64::from(reading.last_lap_time));
        let fuel = self.fuel.update(i32::from(reading.lap_number), f64::from(reading.fuel));

        let interval = IntervalReadout {
            delta,
            text: display::format_delta(delta.unwrap_or(0.0)),
            trend: delta.map(Trend::of).unwrap_or_default(),
        };

        let tires = Corners {
            fl: (reading.tire_wear.fl, reading.tire_temp.fl, reading.tire_combined_slip.fl),
            fr: (reading.tire_wear.fr, reading.tire_temp.fr, reading.tire_combined_slip.fr),
            rl: (reading.tire_wear.rl, reading.tire_temp.rl, reading.tire_combined_slip.rl),
            rr: (reading.tire_wear.rr, reading.tire_temp.rr, reading.tire_combined_slip.rr),
        }
        .map(|(wear, temp, slip)| TireReadout {
            wear_percent: (wear * 100.0) as i32,
            temp,
            band: display::tire_band(temp, cfg),
            slip,
        });

        let fuel = FuelReadout {
            level_percent: fuel.fuel * 100.0,
            usage_percent: fuel.usage_per_lap.map(|u| u * 100.0),
            laps_left: fuel.laps_left,
            low: cfg.low_fuel_warning && fuel.laps_left.is_some_and(|l| l <= 1.0),
        };

        let snapshot = Snapshot {
            event,
            lap: reading.lap_number,
            race_position: reading.race_position,
            distance: display::format_distance(
                f64::from(reading.distance_traveled),
                cfg.distance_units,
            ),
            speed: display::speed_value(f64::from(reading.speed), cfg.speed_units),
            speed_unit: display::speed_unit_label(cfg.speed_units),
            gear: reading.gear,
            shift: display::shift_light(reading.current_engine_rpm, reading.engine_max_rpm, cfg),
            current_lap_time: display::format_lap_time(f64::from(reading.current_lap_time)),
            last_lap_time: display::format_lap_time(f64::from(reading.last_lap_time)),
            best_lap_time: display::format_lap_time(f64::from(reading.best_lap_time)),
            last_lap: display::rate_last_lap(reading.last_lap_time, reading.best_lap_time),
            interval,
            tires,
            fuel,
        };

        Tick { race_on: true, snapshot: Some(snapshot) }
    }

    /// Forgets the reference lap, fuel history and lap sync. For embedders
    /// that keep one pipeline across sessions; the ingest source builds a
    /// fresh pipeline on every run instead.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.interval.reset();
        self.fuel.reset();
    }
}
