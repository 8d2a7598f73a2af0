//! # Pilot DAQ Core Library
//!
//! This crate is the core library for the `pilot-daq` application: a small,
//! fully synchronous control and acquisition stack for a laser current-scan
//! rig consisting of a pilot laser controller and an M6812 data-acquisition
//! board, both driven over byte-stream serial transports with a line-oriented,
//! SCPI-like ASCII protocol.
//!
//! The heart of the crate is the instrument protocol binding layer:
//!
//! - **`protocol`**: a declarative registry that compiles a static table of
//!   [`protocol::CommandSpec`]s into a [`protocol::BoundDevice`] exposing
//!   named read/write operations. Protocol knowledge lives only in the
//!   tables; dispatch is pure.
//! - **`reader`**: a reliable byte reader that guarantees exact-length reads
//!   over a transport that may return partial or empty chunks, bounded by a
//!   consecutive-empty-poll retry budget.
//! - **`frame`**: a binary frame decoder that reconstructs columnar
//!   [`frame::SampleSet`]s from the board's fixed 7-byte telemetry records.
//!
//! Around that core:
//!
//! - **`transport`**: the byte-stream boundary — the [`transport::Transport`]
//!   trait, a `serialport`-backed implementation (behind the
//!   `instrument_serial` feature), and a scripted mock for tests.
//! - **`device`**: the per-instrument command tables and typed wrappers for
//!   the pilot laser controller and the M6812 board.
//! - **`metadata`**: the ordered string-keyed metadata snapshot map.
//! - **`scan`**: the laser current sweep loop, one sample set per step.
//! - **`storage`**: the CSV step writer (behind the `storage_csv` feature).
//! - **`config`**: TOML settings loading and validation.
//! - **`error`**: the centralized [`error::DaqError`] enum.

pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod protocol;
pub mod reader;
pub mod scan;
#[cfg(feature = "storage_csv")]
pub mod storage;
pub mod transport;
