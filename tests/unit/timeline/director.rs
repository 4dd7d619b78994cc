use super::*;

const SCENE: &str = r#"{
    "tracks": [
        {"name": "a", "clips": [
            {"start": 0.0, "end": 1.0, "shape": {"Rect": {"width": 1.0, "height": 1.0}},
             "position": {"Keyframes": {"keys": [
                {"time": 0.0, "value": {"x": 0.0, "y": 0.0}},
                {"time": 1.0, "value": {"x": 2.0, "y": 0.0}}
             ]}}}
        ]},
        {"name": "b", "clips": [
            {"start": 0.0, "end": 2.0, "shape": {"Ellipse": {"rx": 1.0, "ry": 1.0}}},
            {"start": 2.0, "end": 4.0, "shape": {"Ellipse": {"rx": 0.5, "ry": 0.5}}}
        ]},
        {"name": "c", "muted": true, "clips": [
            {"start": 0.0, "end": 8.0, "shape": {"Rect": {"width": 1.0, "height": 1.0}}}
        ]}
    ]
}"#;

fn director() -> Director {
    Director::from_json_str(SCENE).unwrap()
}

#[test]
fn starts_paused_with_unmuted_graph() {
    let d = director();
    assert!(d.is_paused());
    assert_eq!(d.graph(), &[0, 1]);
    assert_eq!(d.active_duration(), 4.0);
}

#[test]
fn mute_changes_apply_on_rebuild() {
    let mut d = director();
    d.set_muted(1, true).unwrap();
    assert_eq!(d.active_duration(), 4.0);
    d.rebuild_graph();
    assert_eq!(d.active_duration(), 1.0);
    assert!(d.track(1).unwrap().muted);
}

#[test]
fn empty_graph_pauses_playback() {
    let mut d = director();
    d.play();
    assert!(!d.is_paused());
    for i in 0..d.track_count() {
        d.set_muted(i, true).unwrap();
    }
    d.rebuild_graph();
    assert!(d.is_paused());
    assert_eq!(d.active_duration(), 0.0);
}

#[test]
fn out_of_range_mute_is_an_error() {
    let mut d = director();
    assert!(d.set_muted(3, true).is_err());
    assert!(d.track(3).is_none());
}

#[test]
fn samples_keyframed_position_at_cursor() {
    let mut d = director();
    d.set_muted(1, true).unwrap();
    d.rebuild_graph();
    d.set_play_cursor(0.5);
    let shapes = d.visible_shapes().unwrap();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].transform.translation(), kurbo::Vec2::new(1.0, 0.0));
}

#[test]
fn final_instant_keeps_last_clip_visible() {
    let mut d = director();
    d.set_muted(0, true).unwrap();
    d.rebuild_graph();

    d.set_play_cursor(2.0);
    let at_boundary = d.visible_shapes().unwrap();
    assert_eq!(at_boundary.len(), 1, "half-open ranges hand off at 2.0");

    d.set_play_cursor(4.0);
    assert_eq!(d.visible_shapes().unwrap().len(), 1);

    d.set_play_cursor(4.5);
    assert!(d.visible_shapes().unwrap().is_empty());
}

#[test]
fn cursor_ignores_non_finite_and_clamps_negative() {
    let mut d = director();
    d.set_play_cursor(1.5);
    d.set_play_cursor(f64::NAN);
    assert_eq!(d.play_cursor(), 1.5);
    d.set_play_cursor(-3.0);
    assert_eq!(d.play_cursor(), 0.0);
}
