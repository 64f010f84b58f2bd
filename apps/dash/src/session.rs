use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use analysis::{display::ShiftLight, Snapshot};
use delta_ingest_core::{DashEvent, DashRx, DashUpdate};
use parking_lot::Mutex;
use tracing::{info, warn};

/// Latest state seen by the dashboard consumer.
pub struct DashSession {
    pub inner: Mutex<Inner>,
}

#[derive(Default)]
pub struct Inner {
    pub racing: bool,
    pub latest: Option<DashUpdate>,
    pub updates: u64,
    pub stopped: bool,
}

impl DashSession {
    pub fn new() -> Self { Self { inner: Mutex::new(Inner::default()) } }
}

#[derive(Clone, Copy)]
pub struct RenderOpts {
    pub json: bool,
    pub every: Duration,
}

/// Drains events on a plain thread until the source stops or goes away.
pub fn spawn_consumer(rx: DashRx, session: Arc<DashSession>, opts: RenderOpts) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut last_render: Option<Instant> = None;
        for event in rx.iter() {
            match event {
                DashEvent::RaceState(on) => {
                    let mut inner = session.inner.lock();
                    if inner.racing && !on && !opts.json {
                        println!("NOT RACING");
                    }
                    inner.racing = on;
                }
                DashEvent::Update(update) => {
                    let due = last_render.map_or(true, |t| t.elapsed() >= opts.every);
                    if due {
                        render(&update.snapshot, opts.json);
                        last_render = Some(Instant::now());
                    }
                    let mut inner = session.inner.lock();
                    inner.latest = Some(*update);
                    inner.updates += 1;
                }
                DashEvent::Stopped => {
                    let mut inner = session.inner.lock();
                    if !opts.json {
                        println!("NOT RACING");
                    }
                    inner.racing = false;
                    inner.stopped = true;
                    break;
                }
            }
        }
        let inner = session.inner.lock();
        info!(updates = inner.updates, "dashboard consumer finished");
    })
}

fn render(snap: &Snapshot, json: bool) {
    if json {
        match serde_json::to_string(snap) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(%err, "could not encode snapshot"),
        }
        return;
    }
    println!("{}", summary_line(snap));
    if snap.fuel.low {
        println!("PIT THIS LAP");
    }
}

pub fn summary_line(snap: &Snapshot) -> String {
    let shift = match snap.shift {
        ShiftLight::Normal => "",
        ShiftLight::Ready => " ready",
        ShiftLight::Shift => " SHIFT",
    };
    let fuel = match snap.fuel.laps_left {
        Some(laps) => format!("{:.2}% ({laps:.2} laps)", snap.fuel.level_percent),
        None => format!("{:.2}%", snap.fuel.level_percent),
    };
    let wear = snap.tires.map(|t| t.wear_percent);
    format!(
        "L{} P{} {} | {} | {} {} G{}{} | fuel {} | wear {}/{}/{}/{}% | {}",
        snap.lap,
        snap.race_position,
        snap.current_lap_time,
        snap.interval.text,
        snap.speed,
        snap.speed_unit,
        snap.gear,
        shift,
        fuel,
        wear.fl, wear.fr, wear.rl, wear.rr,
        snap.distance,
    )
}
