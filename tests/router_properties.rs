use syncwall::control::{dispatch, Argument, ControlMessage, Dispatch, DropReason, RouteError};
use syncwall::output::Rect;
use syncwall::settings::{OutputSettings, SettingsDocument};
use syncwall::NodeState;

fn node_with_outputs(names: &[&str]) -> NodeState {
    let mut doc = SettingsDocument::default();
    doc.node.client_id = "wall7".into();
    doc.outputs = names.iter().map(|n| OutputSettings::named(*n)).collect();
    NodeState::from_document(doc)
}

fn send(state: &mut NodeState, address: &str, args: Vec<Argument>) -> Dispatch {
    dispatch(state, &ControlMessage::new(address, args))
}

#[test]
fn crop_component_update_touches_only_target_output() {
    let mut state = node_with_outputs(&["A", "B"]);
    assert!(!state.any_settings_dirty());

    let result = send(&mut state, "/client/wall7/output/A/crop/x", vec![Argument::Float(3.5)]);
    assert_eq!(result, Dispatch::Applied);

    let a = state.output("A").unwrap();
    assert_eq!(a.settings().crop_origin.x, 3.5);
    assert_eq!(a.settings().crop_origin.y, 0.0);
    assert!(a.is_settings_dirty());
    assert!(!state.output("B").unwrap().is_settings_dirty());
    assert!(!state.is_settings_dirty());
}

#[test]
fn unknown_suffix_changes_nothing() {
    let mut state = node_with_outputs(&["A"]);
    let before = state.to_document();

    for address in ["/client/wall7/warp_speed", "/client/wall7/output/A/crop/depth", "/teleport"] {
        let result = send(&mut state, address, vec![Argument::Int(1)]);
        assert!(matches!(result, Dispatch::Dropped(DropReason::UnknownAddress(_))), "{}", address);
    }

    assert!(!state.any_settings_dirty());
    assert_eq!(state.to_document(), before);
    assert_eq!(state.take_events(), Default::default());
}

#[test]
fn other_clients_are_isolated() {
    let mut state = node_with_outputs(&["A"]);
    let result = send(&mut state, "/client/wall8/frame_number", vec![Argument::Int(10)]);
    assert_eq!(
        result,
        Dispatch::Dropped(DropReason::Route(RouteError::OtherClient("wall8".into())))
    );
    assert_eq!(state.frames().current_frame(), 0);
}

#[test]
fn unknown_output_is_dropped() {
    let mut state = node_with_outputs(&["A"]);
    let result = send(&mut state, "/client/wall7/output/Z/blend/top", vec![Argument::Float(10.0)]);
    assert_eq!(result, Dispatch::Dropped(DropReason::UnknownOutput("Z".into())));
}

#[test]
fn whitespace_around_address_is_ignored() {
    let mut state = node_with_outputs(&["A"]);
    let result = send(&mut state, " \t/client/wall7/frame_number\t", vec![Argument::Long(1 << 40)]);
    assert!(result.is_applied());
    assert_eq!(state.frames().current_frame(), 1 << 40);
}

#[test]
fn output_lifecycle_through_messages() {
    let mut state = node_with_outputs(&["A"]);

    assert!(send(&mut state, "/client/wall7/add_output", vec![]).is_applied());
    assert!(state.output("2").is_some());

    // Adding an existing name is a no-op
    let result = send(&mut state, "/add_output", vec![Argument::String("A".into())]);
    assert_eq!(result, Dispatch::Dropped(DropReason::DuplicateOutput("A".into())));
    assert_eq!(state.output_count(), 2);

    assert!(send(&mut state, "/delete_output", vec![Argument::String("A".into())]).is_applied());
    assert!(!send(&mut state, "/delete_output", vec![Argument::String("A".into())]).is_applied());
    assert_eq!(state.output_names(), vec!["2".to_string()]);
}

#[test]
fn geometry_follows_settings_lazily() {
    let mut state = node_with_outputs(&["A"]);
    let viewport = Rect::from_size(640.0, 480.0);

    let output = state.output_mut("A").unwrap();
    assert!(output.update_geometry(1920, 1080, &viewport));
    assert!(!output.update_geometry(1920, 1080, &viewport));
    assert!(output.transform().blend_meshes.is_empty());

    send(&mut state, "/client/wall7/output/A/blend/left", vec![Argument::Float(40.0)]);
    let output = state.output_mut("A").unwrap();
    assert!(output.is_geometry_dirty());
    assert!(output.update_geometry(1920, 1080, &viewport));
    assert_eq!(output.transform().blend_meshes.len(), 1);
}
