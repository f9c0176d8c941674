use std::cell::RefCell;
use std::rc::Rc;

use egui::{Color32, Pos2};
use note_canvas::{Brush, BrushKind, CanvasController, InputEvent, InputState, StrokeDocument};

// Helper to create a laid-out canvas with an active brush
fn create_canvas(width: u32, height: u32, brush: Brush) -> CanvasController {
    let mut canvas = CanvasController::new();
    canvas.resize(width, height);
    canvas.set_brush(Some(brush));
    canvas
}

fn pen(color: &str, width: f32) -> Brush {
    Brush::new(BrushKind::Pen, color, width, 1.0)
}

// Press at the first point, move through the rest, release at the last
fn drag(canvas: &mut CanvasController, points: &[(f32, f32)]) -> bool {
    let pointer_id = 0;
    let mut consumed = true;
    let (first, rest) = points.split_first().expect("at least one point");
    consumed &= canvas.handle_event(InputEvent::PointerDown {
        pos: Pos2::new(first.0, first.1),
        pointer_id,
    });
    for &(x, y) in rest {
        consumed &= canvas.handle_event(InputEvent::PointerMove {
            pos: Pos2::new(x, y),
            pointer_id,
        });
    }
    let last = points.last().expect("at least one point");
    consumed &= canvas.handle_event(InputEvent::PointerUp {
        pos: Pos2::new(last.0, last.1),
        pointer_id,
    });
    consumed
}

#[test]
fn test_single_pen_stroke_is_recorded() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));

    assert!(drag(&mut canvas, &[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)]));

    let strokes = canvas.get_strokes();
    assert_eq!(strokes.len(), 1);
    let stroke = &strokes[0];
    assert_eq!(stroke.brush_kind(), BrushKind::Pen);
    assert_eq!(stroke.color_hex(), "#FF0000");
    assert_eq!(stroke.stroke_width(), 10.0);

    let path = stroke.path();
    assert_eq!(path.first(), Some(Pos2::new(0.0, 0.0)));
    assert_eq!(path.last(), Some(Pos2::new(100.0, 0.0)));

    let bounds = stroke.bounds();
    assert_eq!(bounds.min, Pos2::new(-5.0, -5.0));
    assert_eq!(bounds.max, Pos2::new(105.0, 5.0));
    assert_eq!(canvas.input_state(), InputState::Idle);
}

#[test]
fn test_later_strokes_paint_over_earlier_ones() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    drag(&mut canvas, &[(10.0, 50.0), (190.0, 50.0)]);

    canvas.set_brush(Some(pen("#0000FF", 10.0)));
    drag(&mut canvas, &[(100.0, 10.0), (100.0, 190.0)]);

    canvas.render_frame();
    assert_eq!(canvas.get_color_at(100, 50), Color32::from_rgb(0, 0, 255));
    assert_eq!(canvas.get_color_at(50, 50), Color32::from_rgb(255, 0, 0));
    assert_eq!(canvas.get_color_at(5, 5), Color32::WHITE);
}

#[test]
fn test_get_color_out_of_bounds_is_black() {
    let mut canvas = create_canvas(50, 50, pen("#FF0000", 10.0));
    assert_eq!(canvas.get_color_at(10, 10), Color32::BLACK);

    canvas.render_frame();
    assert_eq!(canvas.get_color_at(10, 10), Color32::WHITE);
    assert_eq!(canvas.get_color_at(-1, 10), Color32::BLACK);
    assert_eq!(canvas.get_color_at(10, 50), Color32::BLACK);
}

#[test]
fn test_no_brush_ignores_input() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    canvas.set_brush(None);

    assert!(!drag(&mut canvas, &[(0.0, 0.0), (100.0, 0.0)]));
    assert_eq!(canvas.stroke_count(), 0);
}

#[test]
fn test_zero_length_stroke_is_committed_without_pixels() {
    let mut canvas = create_canvas(100, 100, pen("#FF0000", 10.0));
    drag(&mut canvas, &[(40.0, 40.0)]);

    let strokes = canvas.get_strokes();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].geometry(), "");

    canvas.render_frame();
    assert_eq!(canvas.get_color_at(40, 40), Color32::WHITE);
}

#[test]
fn test_stroke_width_is_clamped() {
    let mut canvas = CanvasController::new();
    canvas.set_brush(Some(Brush {
        kind: BrushKind::Marker,
        color_hex: "#00FF00".to_owned(),
        stroke_width: 250.0,
        opacity: 1.0,
    }));
    assert_eq!(canvas.brush().map(|brush| brush.stroke_width), Some(100.0));
}

#[test]
fn test_undo_removes_latest_stroke() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    drag(&mut canvas, &[(10.0, 50.0), (190.0, 50.0)]);
    canvas.set_brush(Some(pen("#0000FF", 10.0)));
    drag(&mut canvas, &[(100.0, 10.0), (100.0, 190.0)]);

    assert!(canvas.undo());
    assert_eq!(canvas.stroke_count(), 1);

    canvas.render_frame();
    assert_eq!(canvas.get_color_at(100, 50), Color32::from_rgb(255, 0, 0));
    assert_eq!(canvas.get_color_at(100, 150), Color32::WHITE);

    assert!(canvas.undo());
    assert!(!canvas.undo());
}

#[test]
fn test_clear_empties_canvas() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    drag(&mut canvas, &[(10.0, 50.0), (190.0, 50.0)]);

    canvas.clear();
    assert_eq!(canvas.stroke_count(), 0);

    canvas.render_frame();
    assert_eq!(canvas.get_color_at(50, 50), Color32::WHITE);
}

#[test]
fn test_loaded_strokes_replay_like_live_drawing() {
    let mut live = create_canvas(160, 120, pen("#FF0000", 8.0));
    drag(&mut live, &[(10.0, 20.0), (80.0, 60.0), (150.0, 20.0)]);
    live.set_brush(Some(Brush::new(BrushKind::DashLine, "#336699", 6.0, 0.8)));
    drag(&mut live, &[(20.0, 100.0), (140.0, 30.0)]);

    let mut restored = CanvasController::new();
    restored.load_strokes(live.get_strokes());
    restored.resize(160, 120);

    let live_frame = live.render_frame().expect("live frame").data().to_vec();
    let restored_frame = restored.render_frame().expect("restored frame").data().to_vec();
    assert!(live_frame == restored_frame, "replayed pixels differ from live drawing");
}

#[test]
fn test_strokes_survive_document_round_trip() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    drag(&mut canvas, &[(10.0, 50.0), (190.0, 50.0)]);
    drag(&mut canvas, &[(10.0, 80.0), (190.0, 80.0)]);

    let path = std::env::temp_dir().join(format!("note_canvas_{}.json", uuid::Uuid::new_v4()));
    StrokeDocument::new(canvas.get_strokes()).save(&path).unwrap();
    let document = StrokeDocument::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(document.strokes, canvas.get_strokes());
    let mut restored = CanvasController::new();
    restored.load_strokes(document.strokes);
    restored.resize(200, 200);
    restored.render_frame();
    assert_eq!(restored.get_color_at(100, 80), Color32::from_rgb(255, 0, 0));
}

#[test]
fn test_eyedropper_picks_once() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    drag(&mut canvas, &[(10.0, 50.0), (190.0, 50.0)]);

    let picked = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&picked);
    canvas.set_on_color_picked(move |color| sink.borrow_mut().push(color));
    canvas.set_eyedropper(true);

    // The pick turns the mode off, so the release reaches an idle canvas
    assert!(canvas.handle_event(InputEvent::PointerDown {
        pos: Pos2::new(100.0, 50.0),
        pointer_id: 0,
    }));
    canvas.handle_event(InputEvent::PointerUp {
        pos: Pos2::new(100.0, 50.0),
        pointer_id: 0,
    });
    assert_eq!(*picked.borrow(), vec![Color32::from_rgb(255, 0, 0)]);
    assert!(!canvas.is_eyedropper_enabled());
    assert_eq!(canvas.stroke_count(), 1);
}

#[test]
fn test_zoom_mode_pans_instead_of_drawing() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    canvas.set_zoom(true);

    assert!(canvas.handle_event(InputEvent::Pinch { scale_factor: 2.0 }));
    assert!(drag(&mut canvas, &[(10.0, 10.0), (40.0, 30.0)]));
    assert_eq!(canvas.stroke_count(), 0);
    assert_eq!(canvas.view().scale(), 2.0);
    assert_eq!(canvas.view().translation(), egui::vec2(30.0, 20.0));

    canvas.set_zoom(false);
    assert!(canvas.view().is_identity());
    drag(&mut canvas, &[(10.0, 10.0), (40.0, 30.0)]);
    assert_eq!(canvas.stroke_count(), 1);
}

#[test]
fn test_enabling_zoom_drops_gesture_in_progress() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    canvas.handle_event(InputEvent::PointerDown {
        pos: Pos2::new(10.0, 10.0),
        pointer_id: 0,
    });
    assert_eq!(canvas.input_state(), InputState::Drawing { eraser: false });

    canvas.set_zoom(true);
    assert_eq!(canvas.input_state(), InputState::Idle);
    canvas.set_zoom(false);
    canvas.handle_event(InputEvent::PointerUp {
        pos: Pos2::new(50.0, 10.0),
        pointer_id: 0,
    });
    assert_eq!(canvas.stroke_count(), 0);
}

#[test]
fn test_divider_blocks_strokes_above_it() {
    let mut canvas = create_canvas(200, 200, pen("#FF0000", 10.0));
    canvas.set_divider_y(60.0);

    assert!(!drag(&mut canvas, &[(10.0, 20.0), (100.0, 20.0)]));
    assert_eq!(canvas.stroke_count(), 0);

    drag(&mut canvas, &[(10.0, 100.0), (100.0, 100.0)]);
    assert_eq!(canvas.stroke_count(), 1);
}

#[test]
fn test_drawing_near_bottom_grows_canvas() {
    let mut canvas = create_canvas(300, 400, pen("#FF0000", 4.0));
    drag(&mut canvas, &[(10.0, 10.0), (10.0, 150.0)]);
    assert!(!canvas.take_relayout_request());

    drag(&mut canvas, &[(10.0, 150.0), (10.0, 320.0)]);
    assert_eq!(canvas.min_height(), 520.0);
    assert!(canvas.take_relayout_request());
    assert!(!canvas.take_relayout_request());
}

#[test]
fn test_drawing_bitmap_falls_back_without_layout() {
    let mut canvas = CanvasController::new();
    canvas.set_brush(Some(pen("#FF0000", 10.0)));

    let bitmap = canvas.drawing_bitmap().expect("fallback bitmap");
    assert_eq!((bitmap.width(), bitmap.height()), (100, 100));
}

#[test]
fn test_export_png_writes_frame() {
    let mut canvas = create_canvas(64, 48, pen("#FF0000", 6.0));
    drag(&mut canvas, &[(5.0, 24.0), (60.0, 24.0)]);

    let path = std::env::temp_dir().join(format!("note_canvas_{}.png", uuid::Uuid::new_v4()));
    canvas.export_png(&path).unwrap();
    let image = image::open(&path).unwrap().to_rgba8();
    std::fs::remove_file(&path).ok();

    assert_eq!(image.dimensions(), (64, 48));
    assert_eq!(image.get_pixel(30, 24).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(30, 2).0, [255, 255, 255, 255]);
}
