use std::sync::Arc;
use std::time::{Duration, Instant};

use super::plan::{Operation, PlanTable};
use crate::devices::{DeviceSet, DeviceSlot, Palette};
use crate::midi::{Action, ActionTable, RawControlMessage};
use crate::runner::{DeviceRunner, TaskHandle, TaskOutcome};
use crate::shutdown::ShutdownSignal;

/// Result of dispatching one action.
pub struct Dispatch {
    pub action: Action,
    /// One handle per submitted device operation, in plan order.
    pub handles: Vec<TaskHandle>,
    pub shutdown_requested: bool,
}

impl Dispatch {
    /// Wait for every operation, sharing one deadline. Operations still
    /// running when it passes are reported as `None`.
    pub fn wait(&self, timeout: Duration) -> Vec<Option<TaskOutcome>> {
        let deadline = Instant::now() + timeout;
        self.handles
            .iter()
            .map(|handle| handle.wait(deadline.saturating_duration_since(Instant::now())))
            .collect()
    }
}

/// Turns classified actions into device operations on the runner.
///
/// Holds no state between actions: every action maps to the same plan no
/// matter what came before.
pub struct Coordinator {
    classifier: ActionTable,
    plans: PlanTable,
    palette: Palette,
    devices: Arc<DeviceSet>,
    runner: Arc<DeviceRunner>,
    shutdown: ShutdownSignal,
}

impl Coordinator {
    pub fn new(devices: DeviceSet, runner: Arc<DeviceRunner>, shutdown: ShutdownSignal) -> Self {
        Self {
            classifier: ActionTable::default(),
            plans: PlanTable::default(),
            palette: Palette::default(),
            devices: Arc::new(devices),
            runner,
            shutdown,
        }
    }

    pub fn with_tables(mut self, classifier: ActionTable, plans: PlanTable, palette: Palette) -> Self {
        self.classifier = classifier;
        self.plans = plans;
        self.palette = palette;
        self
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Entry point for the receive path: classify and dispatch.
    pub fn on_message(&self, msg: RawControlMessage) -> Dispatch {
        let action = self.classifier.classify(&msg);
        if action == Action::Unknown {
            log::info!("{}\tunrecognised, ignoring", msg);
        } else {
            log::info!("{}\t{}", msg, action);
        }
        self.on_action(action)
    }

    /// Submit every operation of `action`'s plan whose device is present.
    /// Returns without waiting for any device.
    pub fn on_action(&self, action: Action) -> Dispatch {
        match action {
            Action::RecordStart => log::info!("Recording started"),
            Action::RecordStop => log::info!("Recording stopped"),
            Action::Play => log::info!("Playback started"),
            Action::Stop => log::info!("Playback stopped"),
            Action::TrackLeft => log::info!("Track left"),
            Action::TrackRight => log::info!("Track right"),
            Action::AllNotesOff => log::info!("All notes off, turning everything off"),
            Action::ResetAll => log::info!("Resetting all devices"),
            Action::SnareOn | Action::SnareOff | Action::Unknown => {}
        }

        let handles = self
            .plans
            .plan_for(action)
            .iter()
            .filter_map(|planned| self.submit(action, planned.slot, &planned.op))
            .collect();

        let shutdown_requested = action.requests_shutdown();
        if shutdown_requested {
            self.shutdown.trigger();
        }

        Dispatch {
            action,
            handles,
            shutdown_requested,
        }
    }

    fn submit(&self, action: Action, slot: DeviceSlot, op: &Operation) -> Option<TaskHandle> {
        let device = Arc::clone(self.devices.get(slot)?);

        let handle = match op {
            Operation::TurnOn(color_name) => {
                let color = color_name.as_deref().and_then(|name| {
                    let color = self.palette.get(name);
                    if color.is_none() {
                        log::warn!("Unknown color '{}', turning {} on without it", name, slot);
                    }
                    color
                });
                let label = match color {
                    Some(color) => format!("{}: {} on {}", action, slot, color),
                    None => format!("{}: {} on", action, slot),
                };
                self.runner
                    .submit(label, async move { device.turn_on(color).await })
            }
            Operation::TurnOff => self
                .runner
                .submit(format!("{}: {} off", action, slot), async move {
                    device.turn_off().await
                }),
            Operation::HealthCheck => self
                .runner
                .submit(format!("{}: {} health check", action, slot), async move {
                    device.health_check().await
                }),
        };
        Some(handle)
    }

    /// Best-effort cleanup: command every present device off, then give the
    /// runner `grace` to finish. Returns how many operations were abandoned.
    pub fn shutdown(&self, grace: Duration) -> usize {
        for (slot, device) in self.devices.present() {
            let device = Arc::clone(device);
            self.runner
                .submit(format!("shutdown: {} off", slot), async move {
                    device.turn_off().await
                });
        }
        self.runner.shutdown(grace)
    }
}
