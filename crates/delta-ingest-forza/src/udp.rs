use crate::decode::decode;
use analysis::Pipeline;
use anyhow::Context;
use delta_config::DashConfig;
use delta_ingest_core::{DashEvent, DashTx, DashUpdate, IngestError, TelemetrySource};
use model::PacketFormat;
use std::time::Duration;
use tokio::{net::UdpSocket, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const MAX_DATAGRAM: usize = 1024;
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct ForzaConfig {
    pub bind_addr: String,       // e.g. "0.0.0.0:1337"
    pub packet_format: PacketFormat,
    pub dash: DashConfig,
}

impl Default for ForzaConfig {
    fn default() -> Self {
        Self::from_dash(DashConfig::default())
    }
}

impl ForzaConfig {
    pub fn from_dash(dash: DashConfig) -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", dash.port),
            packet_format: dash.packet_format,
            dash,
        }
    }
}

pub struct ForzaSource {
    cfg: ForzaConfig,
}

impl ForzaSource {
    pub fn new(cfg: ForzaConfig) -> Self { Self { cfg } }
}

#[async_trait::async_trait]
impl TelemetrySource for ForzaSource {
    async fn run(&self, tx: DashTx, cancel: CancellationToken) -> Result<(), IngestError> {
        let socket = UdpSocket::bind(&self.cfg.bind_addr).await
            .with_context(|| format!("bind {}", self.cfg.bind_addr))?;
        info!(
            addr = %self.cfg.bind_addr,
            format = %self.cfg.packet_format,
            "listening for Forza data"
        );

        let result = receive(&socket, &self.cfg, &tx, &cancel).await;

        drop(socket);
        info!(addr = %self.cfg.bind_addr, "socket closed");
        let _ = tx.send(DashEvent::Stopped);
        result
    }
}

async fn receive(
    socket: &UdpSocket,
    cfg: &ForzaConfig,
    tx: &DashTx,
    cancel: &CancellationToken,
) -> Result<(), IngestError> {
    let mut pipeline = Pipeline::new();
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut racing = None;

    loop {
        let recv = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            recv = time::timeout(RECV_TIMEOUT, socket.recv_from(&mut buf)) => recv,
        };
        let len = match recv {
            Err(_) => {
                debug!("no datagram within {:?}", RECV_TIMEOUT);
                continue;
            }
            Ok(Err(err)) => {
                warn!(?err, "udp receive failed");
                continue;
            }
            Ok(Ok((len, _peer))) => len,
        };

        let reading = match decode(&buf[..len], cfg.packet_format) {
            Ok(reading) => reading,
            Err(err) => {
                debug!(%err, "dropping packet");
                continue;
            }
        };

        if racing != Some(reading.is_race_on) {
            info!(race_on = reading.is_race_on, "race state changed");
            racing = Some(reading.is_race_on);
        }
        let tick = pipeline.process(&reading, &cfg.dash);
        if tx.send(DashEvent::RaceState(tick.race_on)).is_err() {
            debug!("event receiver dropped");
            return Ok(());
        }
        if let Some(snapshot) = tick.snapshot {
            let update = DashUpdate { reading, snapshot };
            if tx.send(DashEvent::Update(Box::new(update))).is_err() {
                return Ok(());
            }
        }
    }
}
