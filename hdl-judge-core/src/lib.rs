/// Durable per-submission logs and waveforms
pub mod artifact;
/// Per-problem project bundles
pub mod bundle;
/// Command lines of the HDL compiler and simulator
pub mod compiler;
pub mod error;
/// Simulation requests, outcomes and the sandbox runner
pub mod judge;
/// Runtime essentials for running a tool under control
pub mod run;
pub mod utils;
pub mod vcd;
