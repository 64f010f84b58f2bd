use crate::session::{GapCause, LapEvent};
use model::LapTracePoint;
use tracing::info;

/// Distance/time samples for one lap, strictly increasing in distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapTrace {
    points: Vec<LapTracePoint>,
}

impl LapTrace {
    pub fn new() -> Self { Self::default() }

    pub fn points(&self) -> &[LapTracePoint] { &self.points }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn clear(&mut self) { self.points.clear() }

    /// Appends `point` unless its distance is negative, NaN, or not past the
    /// last stored point. Returns whether it was stored.
    pub fn insert(&mut self, point: LapTracePoint) -> bool {
        if point.distance.is_nan() || point.distance < 0.0 {
            return false;
        }
        if let Some(last) = self.points.last() {
            if point.distance <= last.distance {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    /// The stored point closest in distance to `distance`. Equal
    /// differences resolve to the earlier point.
    pub fn nearest(&self, distance: f64) -> Option<&LapTracePoint> {
        let idx = self.points.partition_point(|p| p.distance < distance);
        let before = idx.checked_sub(1).and_then(|i| self.points.get(i));
        let after = self.points.get(idx);
        match (before, after) {
            (Some(b), Some(a)) => {
                if (distance - b.distance).abs() <= (a.distance - distance).abs() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (b, a) => b.or(a),
        }
    }
}

/// Compares the lap in progress against the fastest complete lap seen so far,
/// at matching lap distance.
///
/// The reference is this engine's own best, taken from `last_lap_time` on each
/// new lap, not the game's best lap, so dirty laps still produce an interval.
#[derive(Debug, Clone, Default)]
pub struct IntervalEngine {
    best_lap: Option<f64>,
    best: LapTrace,
    current: LapTrace,
    delta: Option<f64>,
}

impl IntervalEngine {
    pub fn new() -> Self { Self::default() }

    pub fn best_lap(&self) -> Option<f64> { self.best_lap }
    pub fn best_trace(&self) -> &LapTrace { &self.best }
    pub fn current_trace(&self) -> &LapTrace { &self.current }

    /// Last computed delta in seconds; negative means ahead of the best lap.
    pub fn delta(&self) -> Option<f64> { self.delta }

    /// Feeds one tick. `point` is lap-relative and already uses the distance
    /// factor set by the tracker for this tick.
    pub fn update(
        &mut self,
        event: LapEvent,
        point: LapTracePoint,
        last_lap_time: f64,
    ) -> Option<f64> {
        match event {
            LapEvent::GapDetected(GapCause::MissedBoundary) | LapEvent::Resynced => {
                self.current.clear();
            }
            LapEvent::NewLap => {
                self.finish_lap(last_lap_time);
                self.current.clear();
            }
            _ => {}
        }
        if !event.is_recording() {
            return self.delta;
        }

        self.current.insert(point);
        if let Some(d) = self.delta_at(point) {
            self.delta = Some(d);
        }
        self.delta
    }

    /// Delta of `point` against the best trace, without touching state.
    pub fn delta_at(&self, point: LapTracePoint) -> Option<f64> {
        self.best.nearest(point.distance).map(|best| point.time - best.time)
    }

    fn finish_lap(&mut self, last_lap_time: f64) {
        let improved = match self.best_lap {
            None => true,
            Some(best) => best <= 0.0 || last_lap_time < best,
        };
        if improved {
            info!(lap_time = last_lap_time, points = self.current.len(), "new reference lap");
            self.best = self.current.clone();
            self.best_lap = Some(last_lap_time);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
