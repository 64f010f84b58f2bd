//! Dashboard and dump-tool configuration, read from YAML.
//!
//! Every key is optional; a missing file or key falls back to the
//! documented default so the pipeline always has a usable config.

use model::{PacketFormat, ParamId};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr};
use tracing::{debug, warn};

pub const DEFAULT_PORT: u16 = 1337;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("parsing {path}: {source}")]
    Parse { path: String, #[source] source: serde_yaml::Error },
    #[error("encoding config: {0}")]
    Encode(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

/// Live dashboard settings. Keys match the dashboard's `dashConfig.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashConfig {
    pub port: u16,
    pub packet_format: PacketFormat,
    pub speed_units: Units,
    pub distance_units: Units,
    /// Percent of max rpm at which the shift light reads "shift".
    pub redline_percent: u8,
    /// Percent of max rpm at which the shift light reads "ready".
    pub ready_percent: u8,
    // tire temperature band edges, same unit the game sends (F)
    pub tire_temp_blue: f32,
    pub tire_temp_yellow: f32,
    pub tire_temp_red: f32,
    pub low_fuel_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_list: Option<Vec<ParamId>>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            packet_format: PacketFormat::Dash,
            speed_units: Units::Metric,
            distance_units: Units::Metric,
            redline_percent: 85,
            ready_percent: 75,
            tire_temp_blue: 150.0,
            tire_temp_yellow: 210.0,
            tire_temp_red: 240.0,
            low_fuel_warning: true,
            parameter_list: None,
        }
    }
}

impl DashConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        let cfg: DashConfig = serde_yaml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
        cfg.validate()?;
        debug!(path = %path.display(), "loaded dashboard config");
        Ok(cfg)
    }

    /// Like [`DashConfig::load`] but never fails: problems are logged and the
    /// defaults are used instead.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(%err, "using default dashboard config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_yaml::to_string(self)?;
        fs::write(path, text)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redline_percent > 100 || self.ready_percent > 100 {
            return Err(ConfigError::Invalid("rpm percentages must be within 0..=100".into()));
        }
        if self.ready_percent > self.redline_percent {
            return Err(ConfigError::Invalid(format!(
                "readyPercent ({}) is above redlinePercent ({})",
                self.ready_percent, self.redline_percent
            )));
        }
        let (blue, yellow, red) = (self.tire_temp_blue, self.tire_temp_yellow, self.tire_temp_red);
        if !(blue < yellow && yellow < red) {
            return Err(ConfigError::Invalid(
                "tire temperature bands must satisfy blue < yellow < red".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    #[default]
    Tsv,
    Csv,
}

impl DumpFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            DumpFormat::Tsv => b'\t',
            DumpFormat::Csv => b',',
        }
    }
}

impl FromStr for DumpFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tsv" => Ok(DumpFormat::Tsv),
            "csv" => Ok(DumpFormat::Csv),
            other => Err(ConfigError::Invalid(format!(
                "unknown dump format `{other}` (expected tsv or csv)"
            ))),
        }
    }
}

/// Overrides for the packet dump tool. Any key present replaces the
/// corresponding command-line value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub port: Option<u16>,
    pub output_filename: Option<String>,
    pub format: Option<DumpFormat>,
    pub append: Option<bool>,
    pub packet_format: Option<PacketFormat>,
    pub motec: Option<bool>,
    /// Column names; besides telemetry fields, `wall_clock` is accepted.
    pub parameter_list: Option<Vec<String>>,
}

impl DumpConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        serde_yaml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let f = write_yaml("port: 5300\nspeedUnits: imperial\n");
        let cfg = DashConfig::load(f.path()).unwrap();
        assert_eq!(cfg.port, 5300);
        assert_eq!(cfg.speed_units, Units::Imperial);
        assert_eq!(cfg.distance_units, Units::Metric);
        assert_eq!(cfg.redline_percent, 85);
        assert!(cfg.low_fuel_warning);
    }

    #[test]
    fn parameter_list_parses_into_ids() {
        let f = write_yaml("packetFormat: fh4\nparameterList: [speed, lap_no, tire_temp_FL]\n");
        let cfg = DashConfig::load(f.path()).unwrap();
        assert_eq!(cfg.packet_format, PacketFormat::Fh4);
        assert_eq!(
            cfg.parameter_list,
            Some(vec![ParamId::Speed, ParamId::LapNo, ParamId::TireTempFl])
        );
    }

    #[test]
    fn unknown_parameter_is_a_parse_error() {
        let f = write_yaml("parameterList: [speed, nitrous]\n");
        assert!(matches!(DashConfig::load(f.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn inverted_bands_are_rejected() {
        let f = write_yaml("tireTempBlue: 250\n");
        assert!(matches!(DashConfig::load(f.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DashConfig::load_or_default(dir.path().join("nope.yaml"));
        assert_eq!(cfg, DashConfig::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.yaml");
        let cfg = DashConfig { ready_percent: 70, tire_temp_red: 260.0, ..Default::default() };
        cfg.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("readyPercent: 70"));
        assert_eq!(DashConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn dump_format_parses_cli_names() {
        assert_eq!("csv".parse::<DumpFormat>().unwrap(), DumpFormat::Csv);
        assert_eq!("tsv".parse::<DumpFormat>().unwrap().delimiter(), b'\t');
        assert!("xlsx".parse::<DumpFormat>().is_err());
    }

    #[test]
    fn dump_config_only_sets_named_keys() {
        let f = write_yaml("format: csv\nmotec: true\nparameter_list: [wall_clock, speed]\n");
        let cfg = DumpConfig::load(f.path()).unwrap();
        assert_eq!(cfg.format, Some(DumpFormat::Csv));
        assert_eq!(cfg.motec, Some(true));
        assert_eq!(cfg.port, None);
        assert_eq!(cfg.parameter_list.as_deref().map(|p| p.len()), Some(2));
    }
}
