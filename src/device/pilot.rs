//! Pilot laser controller.
//!
//! SCPI-like controller for the pilot laser: injection current, TEC
//! temperature, piezo waveform generator, and current-coupling status. All
//! protocol strings live in [`PILOT_COMMANDS`]; the [`Pilot`] wrapper adds
//! typed accessors, the validated current/offset writers, the piezo ramp-up
//! routine, and the ordered metadata snapshot.

use crate::device::{chomp, parse_f64};
use crate::error::AppResult;
use crate::metadata::MetadataMap;
use crate::protocol::{BoundDevice, CommandSpec, CommandValue};
use crate::scan::step_values;
use crate::transport::Transport;
use log::{info, warn};

/// Lower piezo offset bound used by the ramp routine (volts).
pub const PIEZO_MIN: f64 = -13.0;
/// Upper piezo offset bound used by the ramp routine (volts).
pub const PIEZO_MAX: f64 = 13.0;

/// Ramp step size (volts).
const PIEZO_RAMP_STEP: f64 = 0.5;

/// Hard limit accepted by the piezo offset writer (volts).
const PIEZO_OFFSET_LIMIT: f64 = 13.5;

fn valid_piezo_offset(value: &CommandValue) -> bool {
    value
        .as_f64()
        .is_some_and(|v| (-PIEZO_OFFSET_LIMIT..=PIEZO_OFFSET_LIMIT).contains(&v))
}

// Negative voltage bias: accept strictly between -3.0 and 0 amps.
fn valid_laser_current(value: &CommandValue) -> bool {
    value.as_f64().is_some_and(|v| v < 0.0 && v > -3.0)
}

/// Command table for the pilot laser controller.
pub const PILOT_COMMANDS: &[CommandSpec] = &[
    CommandSpec::read("*idn?", "identity"),
    CommandSpec::write(":System:echo %s", "echo"),
    CommandSpec::read(":Piezo:Offset?", "piezo_offset"),
    CommandSpec::write_validated(":Piezo:Offset %0.3f", "set_piezo_offset", valid_piezo_offset),
    CommandSpec::read(":Piezo:Frequency?", "piezo_frequency"),
    CommandSpec::write(":Piezo:Frequency %0.2f Hz", "set_piezo_frequency"),
    CommandSpec::read(":Piezo:Frequency:Generator?", "piezo_waveform"),
    // Waveform names are truncated to the three-letter codes OFF|SIN|TRI.
    CommandSpec::write(":Piezo:Frequency:Generator %0.3s", "set_piezo_waveform"),
    CommandSpec::read(":Piezo:Frequency:Amplitude?", "piezo_amplitude"),
    CommandSpec::write(":Piezo:Frequency:Amplitude %0.3f", "set_piezo_amplitude"),
    CommandSpec::read(":Piezo:Voltage?", "piezo_voltage"),
    CommandSpec::read(":Laser:Current?", "laser_current"),
    CommandSpec::write_validated(":Laser:Current %0.3f", "set_laser_current", valid_laser_current),
    CommandSpec::read(":Laser:Status?", "laser_status"),
    CommandSpec::read(":TEC:Temperature?", "laser_temperature"),
    CommandSpec::read(":CCoupling:Enable?", "cc_enable"),
    CommandSpec::read(":CCoupling:Gain?", "cc_gain"),
    CommandSpec::read(":CCoupling:Prescale?", "cc_prescale"),
    CommandSpec::read(":CCoupling:Direction?", "cc_direction"),
];

/// Snapshot order and short keys. Static so repeated snapshots are directly
/// diffable.
const SNAPSHOT_FIELDS: &[(&str, &str)] = &[
    ("LASERID", "identity"),
    ("LASERCUR", "laser_current"),
    ("PIEZOWAV", "piezo_waveform"),
    ("PIEZOFRE", "piezo_frequency"),
    ("PIEZOAMP", "piezo_amplitude"),
    ("PIEZOOFF", "piezo_offset"),
    ("PIEZOVOL", "piezo_voltage"),
    ("LASERTEM", "laser_temperature"),
    ("CCENABLE", "cc_enable"),
];

/// A pilot laser controller bound to one transport.
pub struct Pilot<T: Transport> {
    device: BoundDevice<T>,
}

impl<T: Transport> Pilot<T> {
    /// Bind the pilot command table to `transport`.
    pub fn new(transport: T) -> AppResult<Self> {
        Ok(Self {
            device: BoundDevice::bind(transport, PILOT_COMMANDS)?,
        })
    }

    /// Controller identity string (`*idn?`), raw.
    pub fn identity(&mut self) -> AppResult<String> {
        self.device.read("identity")
    }

    /// Laser injection current, raw response.
    pub fn laser_current(&mut self) -> AppResult<String> {
        self.device.read("laser_current")
    }

    /// Set the laser injection current in amps.
    ///
    /// Returns `Ok(false)` when the value falls outside the accepted
    /// `(-3.0, 0)` range; no command is sent in that case.
    pub fn set_laser_current(&mut self, amps: f64) -> AppResult<bool> {
        self.device.write("set_laser_current", amps)
    }

    /// Piezo DC offset, raw response.
    pub fn piezo_offset(&mut self) -> AppResult<String> {
        self.device.read("piezo_offset")
    }

    /// Piezo DC offset parsed as volts.
    pub fn piezo_offset_value(&mut self) -> AppResult<f64> {
        let raw = self.piezo_offset()?;
        parse_f64(&raw)
    }

    /// Set the piezo DC offset in volts; `Ok(false)` outside ±13.5 V.
    pub fn set_piezo_offset(&mut self, volts: f64) -> AppResult<bool> {
        self.device.write("set_piezo_offset", volts)
    }

    /// Piezo modulation frequency, raw response.
    pub fn piezo_frequency(&mut self) -> AppResult<String> {
        self.device.read("piezo_frequency")
    }

    /// Set the piezo modulation frequency in hertz.
    pub fn set_piezo_frequency(&mut self, hertz: f64) -> AppResult<bool> {
        self.device.write("set_piezo_frequency", hertz)
    }

    /// Piezo waveform generator setting, raw response.
    pub fn piezo_waveform(&mut self) -> AppResult<String> {
        self.device.read("piezo_waveform")
    }

    /// Select the piezo waveform (`OFF`, `SIN`, `TRI`); longer names are
    /// truncated by the template's `%0.3s` directive.
    pub fn set_piezo_waveform(&mut self, waveform: &str) -> AppResult<bool> {
        self.device.write("set_piezo_waveform", waveform)
    }

    /// Piezo waveform amplitude, raw response.
    pub fn piezo_amplitude(&mut self) -> AppResult<String> {
        self.device.read("piezo_amplitude")
    }

    /// Set the piezo waveform amplitude.
    pub fn set_piezo_amplitude(&mut self, amplitude: f64) -> AppResult<bool> {
        self.device.write("set_piezo_amplitude", amplitude)
    }

    /// Laser status word, raw response.
    pub fn laser_status(&mut self) -> AppResult<String> {
        self.device.read("laser_status")
    }

    /// TEC diode temperature, raw response.
    pub fn laser_temperature(&mut self) -> AppResult<String> {
        self.device.read("laser_temperature")
    }

    /// Current-coupling enable flag, raw response.
    pub fn cc_enable(&mut self) -> AppResult<String> {
        self.device.read("cc_enable")
    }

    /// Run the piezo from its current offset to the minimum, sweep to the
    /// maximum, and settle back at zero, in half-volt steps.
    pub fn init_piezo(&mut self) -> AppResult<()> {
        let start = self.piezo_offset_value()?;
        info!(
            "Piezo ramp-up: {:.3} V -> {} V -> {} V -> 0 V",
            start, PIEZO_MIN, PIEZO_MAX
        );

        for leg in [
            step_values(start, PIEZO_MIN, -PIEZO_RAMP_STEP),
            step_values(PIEZO_MIN, PIEZO_MAX, PIEZO_RAMP_STEP),
            step_values(PIEZO_MAX, 0.0, -PIEZO_RAMP_STEP),
        ] {
            for volts in leg {
                if !self.set_piezo_offset(volts)? {
                    warn!("piezo offset {:.3} V rejected during ramp", volts);
                }
            }
        }
        Ok(())
    }

    /// Capture the ordered metadata snapshot for the controller.
    ///
    /// Runs the fixed [`SNAPSHOT_FIELDS`] reads in declared order, stripping
    /// trailing terminator characters from each response. Built fresh on
    /// every call.
    pub fn snapshot(&mut self) -> AppResult<MetadataMap> {
        let mut map = MetadataMap::new();
        for (key, operation) in SNAPSHOT_FIELDS {
            let raw = self.device.read(operation)?;
            map.insert(key, chomp(&raw));
        }
        Ok(map)
    }
}
