//! Live lap analytics: lap tracking, interval to the best lap, fuel
//! projection, and the per-tick snapshot handed to presentation layers.

pub mod display;
pub mod fuel;
pub mod interval;
pub mod pipeline;
pub mod session;

pub use fuel::{FuelEstimator, FuelStatus};
pub use interval::{IntervalEngine, LapTrace};
pub use pipeline::{Pipeline, Snapshot, Tick};
pub use session::{GapCause, LapEvent, SessionTracker};
