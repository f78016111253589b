use std::net::UdpSocket;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reclight_core::{
    classify, Action, Color, Coordinator, Device, DeviceError, DeviceRunner, DeviceSet,
    DeviceSlot, OscListener, OscSender, RawControlMessage, ShutdownSignal, DEFAULT_CHANNEL,
};

const TIMEOUT: Duration = Duration::from_secs(2);

fn spawn_listener(
    channel: &str,
) -> (
    std::net::SocketAddr,
    ShutdownSignal,
    mpsc::Receiver<RawControlMessage>,
    thread::JoinHandle<()>,
) {
    let listener = OscListener::bind("127.0.0.1:0", channel).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel();

    let signal = shutdown.clone();
    let handle = thread::spawn(move || {
        listener
            .serve(&signal, |msg| {
                let _ = tx.send(msg);
            })
            .unwrap();
    });

    (addr, shutdown, rx, handle)
}

#[test]
fn test_record_start_over_udp() {
    let (addr, shutdown, rx, handle) = spawn_listener(DEFAULT_CHANNEL);

    let sender = OscSender::new(addr, DEFAULT_CHANNEL).unwrap();
    sender.send(&RawControlMessage::new(144, 25, 127)).unwrap();

    let received = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(received, RawControlMessage::new(144, 25, 127));
    assert_eq!(classify(&received), Action::RecordStart);

    shutdown.trigger();
    handle.join().unwrap();
}

#[test]
fn test_listener_survives_garbage_and_foreign_channels() {
    let (addr, shutdown, rx, handle) = spawn_listener("/midi");

    let raw = UdpSocket::bind("127.0.0.1:0").unwrap();
    raw.send_to(b"definitely not osc", addr).unwrap();

    OscSender::new(addr, "/other")
        .unwrap()
        .send(&RawControlMessage::new(144, 25, 127))
        .unwrap();

    let sender = OscSender::new(addr, "/midi").unwrap();
    sender.send(&RawControlMessage::new(176, 123, 0)).unwrap();

    // Only the message on our channel gets through
    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap(),
        RawControlMessage::new(176, 123, 0)
    );
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    shutdown.trigger();
    handle.join().unwrap();
}

#[test]
fn test_messages_arrive_in_order() {
    let (addr, shutdown, rx, handle) = spawn_listener(DEFAULT_CHANNEL);
    let sender = OscSender::new(addr, DEFAULT_CHANNEL).unwrap();

    let sent = [
        RawControlMessage::new(144, 25, 127),
        RawControlMessage::new(144, 25, 0),
        RawControlMessage::new(16, 106, 127),
        RawControlMessage::new(16, 105, 127),
    ];
    for msg in &sent {
        sender.send(msg).unwrap();
    }

    let received: Vec<_> = (0..sent.len())
        .map(|_| rx.recv_timeout(TIMEOUT).unwrap())
        .collect();
    assert_eq!(received, sent);

    shutdown.trigger();
    handle.join().unwrap();
}

struct Lamp {
    on: Mutex<Vec<bool>>,
}

#[async_trait]
impl Device for Lamp {
    fn name(&self) -> &str {
        "lamp"
    }

    async fn turn_on(&self, _color: Option<Color>) -> Result<(), DeviceError> {
        self.on.lock().push(true);
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        self.on.lock().push(false);
        Ok(())
    }
}

#[test]
fn test_listener_feeds_coordinator_until_all_notes_off() {
    let lamp = Arc::new(Lamp {
        on: Mutex::new(Vec::new()),
    });
    let runner = Arc::new(DeviceRunner::start().unwrap());
    let shutdown = ShutdownSignal::new();
    let coordinator = Coordinator::new(
        DeviceSet::new().with(DeviceSlot::Lamp, lamp.clone()),
        runner,
        shutdown.clone(),
    );

    let listener = OscListener::bind("127.0.0.1:0", DEFAULT_CHANNEL).unwrap();
    let addr = listener.local_addr().unwrap();
    let signal = shutdown.clone();
    let server = thread::spawn(move || {
        listener
            .serve(&signal, |msg| {
                coordinator.on_message(msg);
            })
            .unwrap();
        coordinator.shutdown(Duration::from_secs(2))
    });

    let sender = OscSender::new(addr, DEFAULT_CHANNEL).unwrap();
    sender.send(&RawControlMessage::new(144, 25, 127)).unwrap();
    thread::sleep(Duration::from_millis(200));
    sender.send(&RawControlMessage::new(176, 123, 0)).unwrap();

    let abandoned = server.join().unwrap();
    assert_eq!(abandoned, 0);
    assert!(shutdown.is_triggered());
    // on, off from the action, off again from shutdown cleanup
    assert_eq!(*lamp.on.lock(), vec![true, false, false]);
}
