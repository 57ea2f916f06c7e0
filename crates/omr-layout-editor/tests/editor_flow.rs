use nalgebra::{Point2, Vector2};
use omr_layout_core::{AlignmentQuality, Dimensions, Template};
use omr_layout_editor::{
    hit_test, render, DrawCommand, EditorEvent, EditorSession, PointerOutcome, VideoFrame,
};

fn two_block_session() -> EditorSession {
    let mut s = EditorSession::new(Template::default());
    s.add_field_block();
    s.add_field_block();
    s.drain_events();
    s
}

#[test]
fn drag_respects_zoom_and_pan() {
    let mut s = two_block_session();
    s.zoom_in();
    s.zoom_in();
    let zoom = s.view().zoom();

    // pan the view by dragging empty space
    assert_eq!(s.pointer_down(Point2::new(5.0, 5.0)), PointerOutcome::PanStarted);
    s.pointer_move(Point2::new(35.0, 15.0));
    s.pointer_up();
    assert_eq!(s.view().pan, Vector2::new(30.0, 10.0));

    // grab Column2 at its origin in view space
    let origin = s.template().block("Column2").map(|b| b.origin()).expect("block");
    let grab = s.view().transform().to_view(origin + Vector2::new(2.0, 2.0));
    assert_eq!(
        s.pointer_down(grab),
        PointerOutcome::DragStarted("Column2".into())
    );
    s.pointer_move(grab + Vector2::new(zoom * 10.0, zoom * 5.0));
    s.pointer_up();

    let moved = s.template().block("Column2").map(|b| b.origin()).expect("block");
    assert!((moved.x - (origin.x + 10.0)).abs() < 1e-9);
    assert!((moved.y - (origin.y + 5.0)).abs() < 1e-9);
    assert_eq!(s.drain_events().len(), 1);
}

#[test]
fn render_switches_between_editor_and_overlay() {
    let s = two_block_session();
    let t = s.template();

    let editor = render(t, s.view(), None, None);
    assert_eq!((editor.width, editor.height), (707.0, 484.0));

    let frame = VideoFrame {
        size: Dimensions::new(1920.0, 1080.0),
        quality: AlignmentQuality::Warning,
    };
    let overlay = render(t, s.view(), None, Some(frame));
    assert_eq!((overlay.width, overlay.height), (1920.0, 1080.0));
    assert!(overlay.texts().any(|g| g == "!"));
    assert!(overlay
        .commands
        .iter()
        .all(|c| !matches!(c, DrawCommand::Image { .. })));
}

#[test]
fn overlapping_blocks_resolve_in_order() {
    let mut s = two_block_session();
    s.set_origin("Column2", Point2::new(100.0, 50.0));
    let hit = hit_test(s.template(), Point2::new(150.0, 100.0)).map(|b| b.id().to_string());
    assert_eq!(hit.as_deref(), Some("Column1"));

    s.pointer_down(Point2::new(150.0, 100.0));
    assert_eq!(s.view().selected.as_deref(), Some("Column1"));
}

#[test]
fn edits_produce_snapshots() {
    let mut s = two_block_session();
    assert!(s.set_bubble_count("Column1", 5));
    assert!(s.set_field_label("Column1", 0, "Name"));
    assert!(!s.set_field_label("Column1", 7, "too far"));

    let events = s.drain_events();
    assert_eq!(events.len(), 2);
    let EditorEvent::TemplateChanged(last) = events.last().expect("event");
    let block = last.block("Column1").expect("block");
    assert_eq!(block.field_labels(), ["Name", "Q2", "Q3", "Q4", "Q5"]);
}

#[test]
fn svg_export_contains_every_bubble() {
    let s = two_block_session();
    let svg = s.render().to_svg();
    assert_eq!(svg.matches("<circle").count(), 2 * 4 * 20);
    assert!(svg.contains(">Column2</text>"));
}
