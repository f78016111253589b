use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use reclight::LinkArgs;
use reclight_core::{
    ActionTable, MidiSource, MidiSourceError, OscSender, RawControlMessage, ShutdownSignal,
};

const SETUP_HINT: &str = "Make sure that Logic Pro X is open, and that a recording light was set up:\n\
     Logic Pro X -> Settings -> Control Surfaces -> Setup -> New -> Recording Light";

/// Forwards every message from a MIDI input port to the controller over OSC.
#[derive(Parser, Debug)]
#[command(name = "reclight-client")]
#[command(about = "Forward DAW MIDI messages to the recording light controller")]
struct Args {
    /// Host running reclight-server
    #[arg(long, visible_alias = "ip", default_value = "rpi.local")]
    hostname: String,

    #[command(flatten)]
    link: LinkArgs,

    /// Open the first MIDI input whose name contains this
    #[arg(long)]
    midi_port: Option<String>,

    /// Config file whose action table is used to label forwarded messages
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Forward every message. Once a message that ends the session has gone out,
/// raise `shutdown`.
fn forwarder(
    classifier: ActionTable,
    sender: OscSender,
    shutdown: ShutdownSignal,
) -> impl FnMut(RawControlMessage) + Send + 'static {
    move |msg| {
        let action = classifier.classify(&msg);
        match sender.send(&msg) {
            Ok(()) => {
                log::info!("Sent MIDI message {} ({})", msg, action);
                if action.requests_shutdown() {
                    log::info!("{} forwarded, shutting down", action);
                    shutdown.trigger();
                }
            }
            Err(e) => log::warn!("Failed to send {}: {}", msg, e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reclight::init_logging();
    let args = Args::parse();

    let settings = reclight::load_settings(args.config.as_deref())?;
    let sender = OscSender::connect(&args.hostname, args.link.port, &args.link.osc_channel)
        .with_context(|| {
            format!(
                "could not reach {}:{} (use 'localhost' when testing locally)",
                args.hostname, args.link.port
            )
        })?;
    log::info!(
        "OSC client set up on {} ({}), channel {}",
        args.hostname,
        sender.destination(),
        sender.channel()
    );

    let shutdown = ShutdownSignal::new();
    let on_midi = forwarder(settings.classifier, sender, shutdown.clone());

    let source = match MidiSource::open(args.midi_port.as_deref(), on_midi) {
        Ok(source) => source,
        Err(e @ MidiSourceError::NoPorts) => {
            log::warn!("{}", SETUP_HINT);
            return Err(e.into());
        }
        Err(e) => return Err(e).context("failed to open MIDI input"),
    };
    log::info!("Opened MIDI port {}", source.port_name());

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Failed to wait for Ctrl-C: {}", e);
            }
            log::info!("Keyboard interrupt received");
        }
        _ = shutdown.triggered() => {}
    }

    drop(source);
    log::info!("Exiting...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;
    use std::time::Duration;

    use reclight_core::osc::codec;

    use super::*;

    fn forward(messages: &[RawControlMessage]) -> (ShutdownSignal, Vec<RawControlMessage>) {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let sender = OscSender::new(receiver.local_addr().unwrap(), "/midi").unwrap();
        let shutdown = ShutdownSignal::new();

        let mut on_midi = forwarder(ActionTable::default(), sender, shutdown.clone());
        for msg in messages {
            on_midi(*msg);
        }

        let mut buf = [0u8; 1536];
        let received = messages
            .iter()
            .map(|_| {
                let len = receiver.recv(&mut buf).unwrap();
                codec::payload(&codec::decode(&buf[..len]).unwrap()[0]).unwrap()
            })
            .collect();
        (shutdown, received)
    }

    #[test]
    fn test_all_notes_off_is_forwarded_then_stops_the_client() {
        let (shutdown, received) = forward(&[RawControlMessage::new(176, 123, 0)]);
        assert_eq!(received, vec![RawControlMessage::new(176, 123, 0)]);
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_other_messages_keep_the_client_running() {
        let messages = [
            RawControlMessage::new(144, 25, 127),
            RawControlMessage::new(16, 106, 127),
            RawControlMessage::new(144, 60, 100),
        ];
        let (shutdown, received) = forward(&messages);
        assert_eq!(received, messages);
        assert!(!shutdown.is_triggered());
    }
}
