//! Configuration management.
//!
//! Settings load from `config/<name>.toml` via the `config` crate and go
//! through a validation pass before anything touches a serial port.

use crate::error::{AppResult, DaqError};
use crate::scan::ScanRange;
use config::Config;
use serde::Deserialize;

/// Top-level application settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Pilot laser controller port.
    pub pilot: PortSettings,
    /// M6812 board port.
    pub board: PortSettings,
    /// Current sweep parameters.
    pub scan: ScanSettings,
    /// Output settings.
    pub storage: StorageSettings,
}

/// One serial port endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct PortSettings {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Baud rate, e.g. `57600`.
    pub baud_rate: u32,
}

/// Current sweep parameters, in amps.
#[derive(Debug, Deserialize, Clone)]
pub struct ScanSettings {
    /// First current value.
    pub start_current: f64,
    /// Last current value.
    pub stop_current: f64,
    /// Step increment.
    pub step_current: f64,
}

/// Output settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Base directory for scan session output.
    pub output_dir: String,
}

impl Settings {
    /// Load settings from `config/<name>.toml` (default: `config/default`).
    pub fn new(config_name: Option<&str>) -> Result<Self, DaqError> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let s = Config::builder()
            .add_source(config::File::with_name(&config_path))
            .build()
            .map_err(DaqError::Config)?;

        s.try_deserialize().map_err(DaqError::Config)
    }

    /// Semantic validation beyond what deserialization catches.
    pub fn validate(&self) -> AppResult<()> {
        for (label, port) in [("pilot", &self.pilot), ("board", &self.board)] {
            if port.port.is_empty() {
                return Err(DaqError::Configuration(format!(
                    "{} port path is empty",
                    label
                )));
            }
            if port.baud_rate == 0 {
                return Err(DaqError::Configuration(format!(
                    "{} baud rate must be non-zero",
                    label
                )));
            }
        }
        self.scan_range().validate()?;
        if self.storage.output_dir.is_empty() {
            return Err(DaqError::Configuration(
                "storage output_dir is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The sweep range described by the scan settings.
    pub fn scan_range(&self) -> ScanRange {
        ScanRange {
            start: self.scan.start_current,
            stop: self.scan.stop_current,
            step: self.scan.step_current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            log_level: "info".to_string(),
            pilot: PortSettings {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 57600,
            },
            board: PortSettings {
                port: "/dev/ttyS0".to_string(),
                baud_rate: 57600,
            },
            scan: ScanSettings {
                start_current: -1.9,
                stop_current: -2.4,
                step_current: -0.002,
            },
            storage: StorageSettings {
                output_dir: "data".to_string(),
            },
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn zero_baud_is_rejected() {
        let mut s = settings();
        s.board.baud_rate = 0;
        assert!(matches!(s.validate(), Err(DaqError::Configuration(_))));
    }

    #[test]
    fn wrong_step_direction_is_rejected() {
        let mut s = settings();
        s.scan.step_current = 0.002;
        assert!(s.validate().is_err());
    }

    #[test]
    fn scan_range_copies_the_sweep_fields() {
        let range = settings().scan_range();
        assert_eq!(range.start, -1.9);
        assert_eq!(range.stop, -2.4);
        assert_eq!(range.step, -0.002);
    }
}
