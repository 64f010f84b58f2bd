use serde::Serialize;

pub const FUEL_HISTORY_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FuelStatus {
    /// Fuel level, 0..1.
    pub fuel: f64,
    /// Average fraction of the tank used per lap, if any usage was seen.
    pub usage_per_lap: Option<f64>,
    pub laps_left: Option<f64>,
}

/// Rolling per-lap fuel usage over the last few laps.
#[derive(Debug, Clone, Default)]
pub struct FuelEstimator {
    history: Option<[f64; FUEL_HISTORY_LEN]>,
    last_lap: Option<i32>,
    laps_left: Option<f64>,
}

impl FuelEstimator {
    pub fn new() -> Self { Self::default() }

    pub fn history(&self) -> Option<&[f64; FUEL_HISTORY_LEN]> { self.history.as_ref() }

    /// Records `fuel` whenever `lap_number` differs from the last call's.
    pub fn update(&mut self, lap_number: i32, fuel: f64) -> FuelStatus {
        if self.last_lap != Some(lap_number) {
            self.last_lap = Some(lap_number);
            self.sample(fuel);
        }
        let usage = self.average_usage();
        if let Some(per_lap) = usage {
            self.laps_left = Some(fuel / per_lap);
        }
        FuelStatus { fuel, usage_per_lap: usage, laps_left: self.laps_left }
    }

    fn sample(&mut self, fuel: f64) {
        match &mut self.history {
            None => self.history = Some([fuel; FUEL_HISTORY_LEN]),
            Some(h) => {
                h.rotate_left(1);
                h[FUEL_HISTORY_LEN - 1] = fuel;
            }
        }
    }

    /// Mean of the positive lap-to-lap drops. Refuels are skipped.
    pub fn average_usage(&self) -> Option<f64> {
        let h = self.history.as_ref()?;
        let (total, laps) = h
            .windows(2)
            .map(|w| w[0] - w[1])
            .filter(|used| *used > 0.0)
            .fold((0.0, 0u32), |(total, laps), used| (total + used, laps + 1));
        (laps > 0).then(|| total / laps as f64)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
