//! CLI entry point for pilot-daq.
//!
//! Subcommands:
//! - `identify`: query both instruments for their identity strings
//! - `snapshot`: print the laser controller's ordered metadata snapshot
//! - `init-piezo`: run the piezo ramp-up routine and settle at zero
//! - `scan`: run the laser current sweep, one CSV file per step

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pilot_daq::config::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pilot-daq")]
#[command(about = "Laser current-scan DAQ over serial instruments", long_about = None)]
struct Cli {
    /// Configuration name under config/ (default: "default")
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query both instruments for their identity strings
    Identify,
    /// Print the laser controller's metadata snapshot
    Snapshot,
    /// Ramp the piezo across its range and settle it at zero
    InitPiezo,
    /// Run the laser current sweep
    Scan {
        /// Output directory (overrides storage.output_dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::new(cli.config.as_deref()).context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.clone()),
    )
    .init();

    match cli.command {
        Commands::Identify => identify(&settings),
        Commands::Snapshot => snapshot(&settings),
        Commands::InitPiezo => init_piezo(&settings),
        Commands::Scan { output } => scan(&settings, output),
    }
}

#[cfg(feature = "instrument_serial")]
mod rig {
    use super::*;
    use pilot_daq::device::m6812::M6812;
    use pilot_daq::device::pilot::Pilot;
    use pilot_daq::transport::serial::SerialTransport;

    pub fn open_pilot(settings: &Settings) -> Result<Pilot<SerialTransport>> {
        let transport = SerialTransport::open(&settings.pilot.port, settings.pilot.baud_rate)
            .with_context(|| format!("Failed to open pilot port '{}'", settings.pilot.port))?;
        Ok(Pilot::new(transport)?)
    }

    pub fn open_board(settings: &Settings) -> Result<M6812<SerialTransport>> {
        let transport = SerialTransport::open(&settings.board.port, settings.board.baud_rate)
            .with_context(|| format!("Failed to open board port '{}'", settings.board.port))?;
        Ok(M6812::new(transport)?)
    }
}

fn identify(settings: &Settings) -> Result<()> {
    #[cfg(feature = "instrument_serial")]
    {
        let mut pilot = rig::open_pilot(settings)?;
        let mut board = rig::open_board(settings)?;
        println!("pilot: {}", pilot.identity()?.trim_end());
        println!("board: {}", board.identity()?.trim_end());
        Ok(())
    }

    #[cfg(not(feature = "instrument_serial"))]
    {
        let _ = settings;
        Err(pilot_daq::error::DaqError::SerialFeatureDisabled.into())
    }
}

fn snapshot(settings: &Settings) -> Result<()> {
    #[cfg(feature = "instrument_serial")]
    {
        let mut pilot = rig::open_pilot(settings)?;
        for (key, value) in &pilot.snapshot()? {
            println!("{} {}", key, value);
        }
        Ok(())
    }

    #[cfg(not(feature = "instrument_serial"))]
    {
        let _ = settings;
        Err(pilot_daq::error::DaqError::SerialFeatureDisabled.into())
    }
}

fn init_piezo(settings: &Settings) -> Result<()> {
    #[cfg(feature = "instrument_serial")]
    {
        let mut pilot = rig::open_pilot(settings)?;
        pilot.init_piezo()?;
        println!("piezo settled at 0 V");
        Ok(())
    }

    #[cfg(not(feature = "instrument_serial"))]
    {
        let _ = settings;
        Err(pilot_daq::error::DaqError::SerialFeatureDisabled.into())
    }
}

fn scan(settings: &Settings, output: Option<PathBuf>) -> Result<()> {
    #[cfg(all(feature = "instrument_serial", feature = "storage_csv"))]
    {
        use pilot_daq::scan::run_scan;
        use pilot_daq::storage::{session_dir, CsvStepWriter};

        let base = output.unwrap_or_else(|| PathBuf::from(&settings.storage.output_dir));
        let dir = session_dir(&base);
        let mut sink = CsvStepWriter::new(&dir)
            .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;

        let mut pilot = rig::open_pilot(settings)?;
        let mut board = rig::open_board(settings)?;

        let summary = run_scan(&mut pilot, &mut board, &settings.scan_range(), &mut sink)?;
        println!(
            "scan complete: {} steps written to {} ({} rejected)",
            summary.steps,
            dir.display(),
            summary.rejected
        );
        Ok(())
    }

    #[cfg(not(all(feature = "instrument_serial", feature = "storage_csv")))]
    {
        let _ = (settings, output);
        anyhow::bail!("scan requires the instrument_serial and storage_csv features")
    }
}
