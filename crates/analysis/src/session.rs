use model::Reading;
use serde::Serialize;
use tracing::debug;

/// `current_lap` before anything has been seen.
pub const NOT_STARTED: i32 = -2;
/// `current_lap` after a missed lap boundary.
pub const LOST: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCause {
    /// Crossed into the next lap with time already on the clock.
    MissedBoundary,
    /// Lap number doesn't follow on from the tracked lap.
    OutOfSync,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LapEvent {
    #[default]
    None,
    LapContinued,
    NewLap,
    Resynced,
    GapDetected(GapCause),
}

impl LapEvent {
    /// Whether the tick belongs to a lap that is being recorded.
    pub fn is_recording(self) -> bool {
        matches!(self, LapEvent::LapContinued | LapEvent::NewLap | LapEvent::Resynced)
    }
}

/// Follows the game's lap counter and only trusts it once a full lap can be
/// recorded from its start line.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTracker {
    current_lap: i32,
    sync_lap: i32,
    distance_factor: f64,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self { current_lap: NOT_STARTED, sync_lap: -1, distance_factor: 0.0 }
    }
}

impl SessionTracker {
    pub fn new() -> Self { Self::default() }

    pub fn current_lap(&self) -> i32 { self.current_lap }
    pub fn sync_lap(&self) -> i32 { self.sync_lap }
    pub fn distance_factor(&self) -> f64 { self.distance_factor }

    /// Distance covered since the start of the tracked lap.
    pub fn lap_distance(&self, reading: &Reading) -> f64 {
        reading.distance_traveled as f64 - self.distance_factor
    }

    pub fn observe(&mut self, reading: &Reading) -> LapEvent {
        let player_lap = i32::from(reading.lap_number);

        if player_lap == self.current_lap {
            return LapEvent::LapContinued;
        }

        if player_lap == self.current_lap + 1 {
            if reading.current_lap_time > 1.0 {
                debug!(player_lap, lap_time = reading.current_lap_time, "lap boundary missed");
                self.current_lap = LOST;
                self.sync_lap = player_lap + 1;
                return LapEvent::GapDetected(GapCause::MissedBoundary);
            }
            self.current_lap += 1;
            self.distance_factor = reading.distance_traveled as f64;
            return LapEvent::NewLap;
        }

        if player_lap == self.sync_lap {
            debug!(player_lap, "laps resynced");
            self.current_lap = self.sync_lap;
            self.distance_factor = reading.distance_traveled as f64;
            LapEvent::Resynced
        } else {
            self.sync_lap = player_lap + 1;
            LapEvent::GapDetected(GapCause::OutOfSync)
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(lap: u16, lap_time: f32, dist: f32) -> Reading {
        Reading {
            is_race_on: true,
            lap_number: lap,
            current_lap_time: lap_time,
            distance_traveled: dist,
            ..Default::default()
        }
    }

    // Drive the tracker to "recording lap 1" from a fresh start on lap 0.
    fn synced_on_lap_one() -> SessionTracker {
        let mut t = SessionTracker::new();
        assert_eq!(t.observe(&reading(0, 30.0, 500.0)), LapEvent::GapDetected(GapCause::OutOfSync));
        assert_eq!(t.sync_lap(), 1);
        assert_eq!(t.observe(&reading(1, 0.02, 1000.0)), LapEvent::Resynced);
        t
    }

    #[test]
    fn starts_waiting_for_a_full_lap() {
        let t = SessionTracker::new();
        assert_eq!(t.current_lap(), NOT_STARTED);
        assert_eq!(t.sync_lap(), -1);
    }

    #[test]
    fn resync_sets_distance_factor() {
        let t = synced_on_lap_one();
        assert_eq!(t.current_lap(), 1);
        assert_eq!(t.distance_factor(), 1000.0);
        assert_eq!(t.lap_distance(&reading(1, 5.0, 1250.0)), 250.0);
    }

    #[test]
    fn clean_line_crossing_is_a_new_lap() {
        let mut t = synced_on_lap_one();
        assert_eq!(t.observe(&reading(1, 80.0, 4000.0)), LapEvent::LapContinued);
        assert_eq!(t.observe(&reading(2, 0.5, 4100.0)), LapEvent::NewLap);
        assert_eq!(t.current_lap(), 2);
        assert_eq!(t.distance_factor(), 4100.0);
    }

    #[test]
    fn late_line_crossing_is_a_gap() {
        let mut t = synced_on_lap_one();
        assert_eq!(
            t.observe(&reading(2, 3.5, 4200.0)),
            LapEvent::GapDetected(GapCause::MissedBoundary)
        );
        assert_eq!(t.current_lap(), LOST);
        assert_eq!(t.sync_lap(), 3);
        assert_eq!(t.distance_factor(), 1000.0);

        // still on lap 2: waiting
        assert_eq!(
            t.observe(&reading(2, 10.0, 4300.0)),
            LapEvent::GapDetected(GapCause::OutOfSync)
        );
        assert_eq!(t.observe(&reading(3, 0.01, 7000.0)), LapEvent::Resynced);
        assert_eq!(t.current_lap(), 3);
    }

    #[test]
    fn exactly_one_second_still_counts_as_clean() {
        let mut t = synced_on_lap_one();
        assert_eq!(t.observe(&reading(2, 1.0, 4100.0)), LapEvent::NewLap);
    }

    #[test]
    fn jump_ahead_only_resumes_on_sync_lap() {
        let mut t = synced_on_lap_one();
        for _ in 0..5 {
            let event = t.observe(&reading(6, 10.0, 0.0));
            assert_eq!(event, LapEvent::GapDetected(GapCause::OutOfSync));
            assert_eq!(t.sync_lap(), 7);
            assert_eq!(t.current_lap(), 1);
        }
        assert_eq!(t.observe(&reading(7, 0.0, 9000.0)), LapEvent::Resynced);
        assert_eq!(t.current_lap(), 7);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut t = synced_on_lap_one();
        t.reset();
        assert_eq!(t, SessionTracker::new());
    }

    #[test]
    fn recording_events() {
        assert!(LapEvent::NewLap.is_recording());
        assert!(LapEvent::Resynced.is_recording());
        assert!(!LapEvent::None.is_recording());
        assert!(!LapEvent::GapDetected(GapCause::OutOfSync).is_recording());
    }
}
