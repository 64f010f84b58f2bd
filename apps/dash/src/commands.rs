use std::{path::PathBuf, sync::Arc, time::{Duration, Instant}};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use delta_config::{DashConfig, DumpConfig, DumpFormat};
use delta_ingest_core::{channel, IngestHandle};
use delta_ingest_forza::{decode, ForzaConfig, ForzaSource, MAX_DATAGRAM};
use iox::{Column, DumpOptions, DumpWriter};
use model::PacketFormat;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::session::{spawn_consumer, DashSession, RenderOpts};

const CONFIG_FILE: &str = "dashConfig.yaml";

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Dashboard config file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured UDP port
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Override the configured packet format (sled, fm7_dash, dash, fh4)
    #[arg(long)]
    pub packet_format: Option<PacketFormat>,
    /// Print one JSON snapshot per line instead of a summary
    #[arg(long)]
    pub json: bool,
    /// Minimum milliseconds between printed updates
    #[arg(long, default_value_t = 250)]
    pub refresh_ms: u64,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Port number to listen on
    pub port: u16,
    /// File to write
    pub output: PathBuf,
    /// tsv or csv
    #[arg(short, long, default_value = "tsv")]
    pub format: DumpFormat,
    /// Append to the file and skip the header row
    #[arg(short, long)]
    pub append: bool,
    /// Packet format sent by the game (sled, fm7_dash, dash, fh4)
    #[arg(short, long, default_value = "dash")]
    pub packet_format: PacketFormat,
    /// YAML file whose keys override these options
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Prepend a pause-compensated `time` column for MoTeC
    #[arg(short, long)]
    pub motec: bool,
    /// Add a UTC wall-clock column
    #[arg(long)]
    pub wall_clock: bool,
    /// Dashboard config whose `parameterList` is used when the dump config has none
    #[arg(long)]
    pub dash_config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Where to write (defaults to the user config directory)
    pub path: Option<PathBuf>,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|d| d.join("forza-delta").join(CONFIG_FILE))
}

fn load_dash_config(path: Option<&PathBuf>) -> DashConfig {
    match path {
        Some(p) => DashConfig::load_or_default(p),
        None => match default_config_path() {
            Some(p) if p.exists() => DashConfig::load_or_default(p),
            _ => {
                debug!("no dashboard config found, using defaults");
                DashConfig::default()
            }
        },
    }
}

pub async fn listen(args: ListenArgs) -> Result<()> {
    let mut dash = load_dash_config(args.config.as_ref());
    if let Some(port) = args.port {
        dash.port = port;
    }
    if let Some(format) = args.packet_format {
        dash.packet_format = format;
    }

    let (tx, rx) = channel();
    let handle = IngestHandle::spawn(ForzaSource::new(ForzaConfig::from_dash(dash)), tx);
    let session = Arc::new(DashSession::new());
    let opts = RenderOpts { json: args.json, every: Duration::from_millis(args.refresh_ms) };
    let consumer = spawn_consumer(rx, session.clone(), opts);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            res = &mut shutdown => {
                res.context("waiting for ctrl-c")?;
                info!("stopping");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                if handle.is_finished() {
                    break;
                }
            }
        }
    }

    let stopped = handle.stop().await;
    consumer.join().map_err(|_| anyhow!("dashboard consumer panicked"))?;
    stopped?;

    let inner = session.inner.lock();
    if let Some(last) = &inner.latest {
        info!(lap = last.snapshot.lap, best = ?last.snapshot.best_lap_time, "session ended");
    }
    Ok(())
}

pub async fn dump(args: DumpArgs) -> Result<()> {
    let overrides = match &args.config {
        Some(path) => DumpConfig::load(path)?,
        None => DumpConfig::default(),
    };
    let port = overrides.port.unwrap_or(args.port);
    let output = overrides.output_filename.clone().map(PathBuf::from).unwrap_or(args.output);
    let format = overrides.format.unwrap_or(args.format);
    let append = overrides.append.unwrap_or(args.append);
    let packet_format = overrides.packet_format.unwrap_or(args.packet_format);
    let motec = overrides.motec.unwrap_or(args.motec);

    let dash = load_dash_config(args.dash_config.as_ref());
    let columns = dump_columns(&overrides, &dash, packet_format, motec, args.wall_clock)?;
    if columns.is_empty() {
        bail!("no columns to write");
    }
    let mut writer = DumpWriter::create(&output, DumpOptions { format, append, columns })
        .with_context(|| format!("open {}", output.display()))?;

    let socket = UdpSocket::bind(("0.0.0.0", port)).await
        .with_context(|| format!("bind port {port}"))?;
    info!(port, output = %output.display(), %packet_format, "listening");

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            res = &mut shutdown => {
                res.context("waiting for ctrl-c")?;
                break;
            }
            recv = socket.recv_from(&mut buf) => {
                let len = match recv {
                    Ok((len, _peer)) => len,
                    Err(err) => {
                        warn!(?err, "udp receive failed");
                        continue;
                    }
                };
                let arrived = Instant::now();
                match decode(&buf[..len], packet_format) {
                    Ok(reading) => {
                        writer.record(&reading, arrived)?;
                    }
                    Err(err) => debug!(%err, "dropping packet"),
                }
            }
        }
    }
    info!(rows = writer.rows(), "dump stopped");
    Ok(())
}

/// Dump config names win, then the dashboard's `parameterList`, then every
/// field of the packet format.
fn dump_columns(
    overrides: &DumpConfig,
    dash: &DashConfig,
    format: PacketFormat,
    motec: bool,
    wall_clock: bool,
) -> Result<Vec<Column>> {
    let names: Option<Vec<String>> = overrides.parameter_list.clone().or_else(|| {
        dash.parameter_list
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.name().to_owned()).collect())
    });
    Ok(iox::columns(format, names.as_deref(), motec, wall_clock)?)
}

pub fn init_config(args: ConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(p) => p,
        None => default_config_path()
            .ok_or_else(|| anyhow!("no user config directory; pass a path"))?,
    };
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    DashConfig::default().save(&path)?;
    println!("{}", path.display());
    Ok(())
}
