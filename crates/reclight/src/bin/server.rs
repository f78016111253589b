use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use reclight::LinkArgs;
use reclight_core::{
    Action, Coordinator, Device, DeviceError, DeviceRunner, DeviceSet, DeviceSettings, DeviceSlot,
    OscListener, ShutdownSignal,
};
use reclight_devices::{DirigeraLight, DirigeraPlug, DummyLamp, GpioLamp, Hub, HubConfig};

/// Listens for MIDI messages over OSC and drives the recording indicators.
#[derive(Parser, Debug)]
#[command(name = "reclight-server")]
#[command(about = "Recording light controller")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    ip: String,

    #[command(flatten)]
    link: LinkArgs,

    /// JSON config with the action table, plans and palette. Written with
    /// defaults if missing.
    #[arg(long)]
    config: Option<PathBuf>,

    /// GPIO line of the lamp (sysfs numbering)
    #[arg(long)]
    lamp_gpio: Option<u32>,

    /// Log instead of driving a real lamp
    #[arg(long, conflicts_with = "lamp_gpio")]
    dummy_lamp: bool,

    /// Name of the RGB light in the IKEA Home smart app
    #[arg(long)]
    rgb_light: Option<String>,

    /// Name of the sunset lamp plug
    #[arg(long)]
    sunset_plug: Option<String>,

    /// Name of the spotlight plug
    #[arg(long)]
    spotlight_plug: Option<String>,

    /// How long devices get to switch off on exit
    #[arg(long, default_value_t = 2000)]
    grace_ms: u64,
}

impl Args {
    /// Flags win over the config file.
    fn device_settings(&self, configured: &DeviceSettings) -> DeviceSettings {
        DeviceSettings {
            lamp_gpio: self.lamp_gpio.or(configured.lamp_gpio),
            rgb_light: self.rgb_light.clone().or_else(|| configured.rgb_light.clone()),
            sunset_plug: self
                .sunset_plug
                .clone()
                .or_else(|| configured.sunset_plug.clone()),
            spotlight_plug: self
                .spotlight_plug
                .clone()
                .or_else(|| configured.spotlight_plug.clone()),
        }
    }
}

fn shared<D: Device + 'static>(device: D) -> Arc<dyn Device> {
    Arc::new(device)
}

async fn build_devices(dummy_lamp: bool, wanted: &DeviceSettings) -> anyhow::Result<DeviceSet> {
    let mut devices = DeviceSet::new();

    if dummy_lamp {
        devices.insert(DeviceSlot::Lamp, shared(DummyLamp::new()));
    } else if let Some(pin) = wanted.lamp_gpio {
        devices.bind(
            DeviceSlot::Lamp,
            GpioLamp::open(pin).map(shared).map_err(DeviceError::from),
        );
    }

    let wants_hub = wanted.rgb_light.is_some()
        || wanted.sunset_plug.is_some()
        || wanted.spotlight_plug.is_some();
    if !wants_hub {
        return Ok(devices);
    }

    // Missing credentials are fatal
    let config = HubConfig::from_env().context("Dirigera devices requested")?;
    match Hub::connect(config) {
        Ok(hub) => bind_hub_devices(&mut devices, &hub, wanted).await,
        Err(e) => log::warn!("Dirigera devices disabled: {}", e),
    }

    Ok(devices)
}

/// Bind the requested hub devices from a single device listing. An
/// unreachable hub disables them all with one warning.
async fn bind_hub_devices(devices: &mut DeviceSet, hub: &Hub, wanted: &DeviceSettings) {
    let listed = match hub.list_devices().await {
        Ok(listed) => listed,
        Err(e) => {
            log::warn!("Dirigera hub unreachable, Dirigera devices disabled: {}", e);
            return;
        }
    };

    if let Some(name) = &wanted.rgb_light {
        devices.bind(
            DeviceSlot::RgbLight,
            DirigeraLight::find(hub, &listed, name).map(shared),
        );
    }
    if let Some(name) = &wanted.sunset_plug {
        devices.bind(
            DeviceSlot::SunsetPlug,
            DirigeraPlug::find(hub, &listed, name).await.map(shared),
        );
    }
    if let Some(name) = &wanted.spotlight_plug {
        devices.bind(
            DeviceSlot::SpotlightPlug,
            DirigeraPlug::find(hub, &listed, name).await.map(shared),
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reclight::init_logging();
    let args = Args::parse();

    let settings = reclight::load_settings(args.config.as_deref())?;
    let wanted = args.device_settings(&settings.devices);
    let devices = build_devices(args.dummy_lamp, &wanted).await?;
    if devices.is_empty() {
        log::warn!("No devices available, actions will only be logged");
    } else {
        log::info!("Devices: {:?}", devices);
    }

    let listener = OscListener::bind((args.ip.as_str(), args.link.port), &args.link.osc_channel)
        .with_context(|| format!("failed to listen on {}:{}", args.ip, args.link.port))?;
    log::info!(
        "Listening on {} for {}",
        listener.local_addr()?,
        listener.channel()
    );

    let runner = Arc::new(DeviceRunner::start().context("failed to start device runner")?);
    let shutdown = ShutdownSignal::new();
    let coordinator = Arc::new(
        Coordinator::new(devices, runner, shutdown.clone()).with_tables(
            settings.classifier,
            settings.plans,
            settings.palette,
        ),
    );

    coordinator.on_action(Action::ResetAll);

    let serve = {
        let coordinator = Arc::clone(&coordinator);
        let shutdown = shutdown.clone();
        tokio::task::spawn_blocking(move || {
            listener.serve(&shutdown, |msg| {
                coordinator.on_message(msg);
            })
        })
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Failed to wait for Ctrl-C: {}", e);
            }
            log::info!("Keyboard interrupt received, shutting down...");
            shutdown.trigger();
        }
        _ = shutdown.triggered() => {}
    }

    serve.await.context("listener task failed")??;

    let grace = Duration::from_millis(args.grace_ms);
    let abandoned = tokio::task::spawn_blocking(move || coordinator.shutdown(grace)).await?;
    if abandoned > 0 {
        log::warn!("{} device operation(s) did not finish", abandoned);
    }

    log::info!("Exiting...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_unreachable_hub_disables_all_hub_devices_at_once() {
        // Nothing listens on the port the hub API uses
        if TcpListener::bind("127.0.0.1:8443").is_err() {
            return;
        }
        let hub = Hub::connect(HubConfig::new("127.0.0.1", "token")).unwrap();
        let wanted = DeviceSettings {
            lamp_gpio: None,
            rgb_light: Some("recording_light".to_string()),
            sunset_plug: Some("sunset".to_string()),
            spotlight_plug: Some("spotlight".to_string()),
        };

        let mut devices = DeviceSet::new().with(DeviceSlot::Lamp, shared(DummyLamp::new()));
        let started = Instant::now();
        bind_hub_devices(&mut devices, &hub, &wanted).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        let slots: Vec<DeviceSlot> = devices.present().map(|(slot, _)| slot).collect();
        assert_eq!(slots, vec![DeviceSlot::Lamp]);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from(["reclight-server", "--sunset-plug", "sunset"]);
        let configured = DeviceSettings {
            lamp_gpio: Some(23),
            rgb_light: Some("recording_light".to_string()),
            sunset_plug: Some("old".to_string()),
            spotlight_plug: None,
        };

        let wanted = args.device_settings(&configured);
        assert_eq!(wanted.lamp_gpio, Some(23));
        assert_eq!(wanted.rgb_light.as_deref(), Some("recording_light"));
        assert_eq!(wanted.sunset_plug.as_deref(), Some("sunset"));
        assert_eq!(wanted.spotlight_plug, None);
        assert_eq!(args.grace_ms, 2000);
    }
}
