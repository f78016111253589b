pub use config::{ConfigError, ConfigFile, ConfigManager, DeviceSettings, Settings};
pub use devices::{Color, Device, DeviceError, DeviceSet, DeviceSlot, Palette};
pub use dispatch::{Coordinator, Dispatch, Operation, PlanTable, PlannedOp};
pub use midi::{
    classify, Action, ActionRule, ActionTable, MidiSource, MidiSourceError, RawControlMessage,
    StatusMatch,
};
pub use osc::{OscListener, OscSender, TransportError, DEFAULT_CHANNEL, DEFAULT_PORT};
pub use runner::{DeviceRunner, RunnerError, TaskHandle, TaskOutcome};
pub use shutdown::ShutdownSignal;

pub mod config;
pub mod devices;
pub mod dispatch;
pub mod midi;
pub mod osc;
pub mod runner;
mod shutdown;
