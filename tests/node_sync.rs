use std::collections::VecDeque;
use std::net::UdpSocket;
use std::path::Path;
use std::time::{Duration, Instant};

use syncwall::control::{Argument, ControlMessage};
use syncwall::media::{HeadlessSurface, ImageSequenceSource, MediaSource};
use syncwall::network::{decode_packet, encode_message, ConfigReport, ConfigSender, OscConfigSender, OscReceiver};
use syncwall::node::ConfigDestination;
use syncwall::output::Rect;
use syncwall::settings::{SettingsStore, XmlSettingsStore};
use syncwall::{App, NodeState};
use tempfile::tempdir;

struct NoSender;

impl ConfigSender for NoSender {
    fn send(&mut self, _: &ConfigDestination, _: &ConfigReport) {}
}

fn write_frames(dir: &Path, count: usize) {
    for i in 0..count {
        image::RgbImage::new(32, 18)
            .save(dir.join(format!("frame_{:03}.png", i)))
            .unwrap();
    }
}

fn start(store: &XmlSettingsStore, sender: Box<dyn ConfigSender>) -> App<ImageSequenceSource, HeadlessSurface> {
    let mut store = store.clone();
    let state = store
        .load()
        .unwrap()
        .map_or_else(NodeState::first_run, NodeState::from_document);
    App::new(
        state,
        ImageSequenceSource::new(),
        HeadlessSurface::new(640, 480),
        Box::new(store),
        sender,
    )
}

#[test]
fn settings_survive_restart() {
    let dir = tempdir().unwrap();
    let frames = dir.path().join("frames");
    std::fs::create_dir(&frames).unwrap();
    write_frames(&frames, 4);
    let store = XmlSettingsStore::new(dir.path().join("conf").join("settings.xml"));

    let mut first = start(&store, Box::new(NoSender));
    let id = first.state().client_id().to_string();
    let out = |path: &str| format!("/client/{}/output/1/{}", id, path);

    let mut inbox = VecDeque::from([
        ControlMessage::new("/source_path", vec![Argument::String(frames.display().to_string())]),
        ControlMessage::new(out("crop/active"), vec![Argument::Int(1)]),
        ControlMessage::new(out("crop/width"), vec![Argument::Float(16.0)]),
        ControlMessage::new(out("crop/height"), vec![Argument::Float(18.0)]),
        ControlMessage::new(out("blend/left"), vec![Argument::Float(12.0)]),
        ControlMessage::new(out("quad/top_left/x"), vec![Argument::Float(0.05)]),
    ]);
    let report = first.tick(&mut inbox);
    assert_eq!(report.applied, 6);
    assert!(report.settings_flushed);
    assert_eq!(first.image_size(), (32, 18));

    let transform = first.state().output("1").unwrap().transform().clone();
    assert_eq!(transform.crop_box, Rect::new(0.0, 0.0, 16.0, 18.0));
    assert_eq!(transform.blend_meshes.len(), 1);

    let mut second = start(&store, Box::new(NoSender));
    assert_eq!(second.state().client_id(), id);
    assert_eq!(second.media().total_frames(), 4);

    let report = second.tick(&mut VecDeque::<ControlMessage>::new());
    assert!(!report.settings_flushed);
    assert_eq!(second.state().output("1").unwrap().transform(), &transform);
}

#[test]
fn deleted_outputs_stay_deleted_after_restart() {
    let dir = tempdir().unwrap();
    let store = XmlSettingsStore::new(dir.path().join("settings.xml"));

    let mut first = start(&store, Box::new(NoSender));
    assert_eq!(first.state().output_names(), vec!["1".to_string()]);

    let mut inbox = VecDeque::from([ControlMessage::new(
        "/delete_output",
        vec![Argument::String("1".into())],
    )]);
    assert!(first.tick(&mut inbox).settings_flushed);
    assert_eq!(first.state().output_count(), 0);

    let second = start(&store, Box::new(NoSender));
    assert_eq!(second.state().output_count(), 0);
    assert_eq!(second.state().client_id(), first.state().client_id());
}

#[test]
fn unreachable_config_destination_does_not_disturb_tick() {
    let dir = tempdir().unwrap();
    let store = XmlSettingsStore::new(dir.path().join("settings.xml"));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut app = start(&store, Box::new(OscConfigSender::new(runtime.handle().clone())));

    let mut inbox = VecDeque::from([
        ControlMessage::new("/frame_number", vec![Argument::Int(3)]),
        ControlMessage::new(
            "/send_config",
            vec![Argument::String("no-such-host.invalid:9000".into())],
        ),
        ControlMessage::new("/show_stats", vec![Argument::Int(1)]),
    ]);
    let report = app.tick(&mut inbox);
    assert_eq!(report.configs_sent, 1);
    assert_eq!(report.applied, 3);
    assert_eq!(report.dropped, 0);
    assert_eq!(app.state().frames().current_frame(), 3);
    assert!(app.state().settings().show_stats);

    // Give the send task time to fail, then keep ticking
    std::thread::sleep(Duration::from_millis(200));
    let mut inbox = VecDeque::from([ControlMessage::new("/frame_number", vec![Argument::Int(4)])]);
    let report = app.tick(&mut inbox);
    assert_eq!(report.applied, 1);
    assert_eq!(app.state().frames().current_frame(), 4);
    assert!(!app.state().frames().in_discontinuity());
}

#[test]
fn control_messages_over_udp_drive_playback() {
    let dir = tempdir().unwrap();
    write_frames(dir.path(), 5);
    let store = XmlSettingsStore::new(dir.path().join("settings.xml"));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut receiver = OscReceiver::bind("127.0.0.1:0".parse().unwrap(), runtime.handle()).unwrap();
    let mut app = start(&store, Box::new(NoSender));

    let controller = UdpSocket::bind("127.0.0.1:0").unwrap();
    let source = ControlMessage::new("/source_path", vec![Argument::String(dir.path().display().to_string())]);
    controller.send_to(&encode_message(&source), receiver.local_addr()).unwrap();
    for n in [6, 7] {
        let msg = ControlMessage::new("/frame_number", vec![Argument::Int(n)]);
        controller.send_to(&encode_message(&msg), receiver.local_addr()).unwrap();
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut applied = 0;
    while applied < 3 && Instant::now() < deadline {
        applied += app.tick(&mut receiver).applied;
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(applied, 3);
    assert_eq!(app.state().frames().current_frame(), 7);
    // 7 wraps to 2 in a five-frame sequence
    assert_eq!(app.media().current_frame(), 2);
    assert!(!app.state().frames().in_discontinuity());
}

#[test]
fn send_config_reaches_controller() {
    let dir = tempdir().unwrap();
    let store = XmlSettingsStore::new(dir.path().join("settings.xml"));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut app = start(&store, Box::new(OscConfigSender::new(runtime.handle().clone())));

    let controller = UdpSocket::bind("127.0.0.1:0").unwrap();
    controller.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let destination = format!("127.0.0.1:{}", controller.local_addr().unwrap().port());

    let mut inbox = VecDeque::from([ControlMessage::new(
        "/send_config",
        vec![Argument::String(destination)],
    )]);
    assert_eq!(app.tick(&mut inbox).configs_sent, 1);

    let mut buf = [0u8; 4096];
    let (len, _) = controller.recv_from(&mut buf).unwrap();
    let messages = decode_packet(&buf[..len]).unwrap();
    assert_eq!(messages[0].address, "/config");

    let Argument::String(xml) = &messages[0].args[0] else {
        panic!("config report must be a string argument");
    };
    assert!(xml.contains(&format!("<clientId>{}</clientId>", app.state().client_id())));
    assert!(xml.contains("<viewportWidth>640</viewportWidth>"));
}
