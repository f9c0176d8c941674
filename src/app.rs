use std::cell::Cell;
use std::rc::Rc;

use egui::{Color32, Pos2, Rect, Sense, TextureHandle, TextureOptions};

use crate::brush::{self, Brush, BrushKind, MAX_STROKE_WIDTH, MIN_STROKE_WIDTH};
use crate::canvas::CanvasController;
use crate::input::InputEvent;
use crate::persistence::StrokeDocument;
use crate::stroke::Stroke;

/// Storage key for the saved stroke document
const STROKES_KEY: &str = "note_canvas_strokes";
/// Storage key for the last used brush
const BRUSH_KEY: &str = "note_canvas_brush";

/// Desktop host for the canvas: a tool panel on the left and the drawing
/// surface filling the rest of the window.
pub struct NoteCanvasApp {
    canvas: CanvasController,
    brush: Brush,
    drawing_enabled: bool,
    picked_color: Rc<Cell<Option<Color32>>>,
    texture: Option<TextureHandle>,
    status: Option<String>,
}

impl Default for NoteCanvasApp {
    fn default() -> Self {
        Self::with_state(Brush::default(), Vec::new())
    }
}

impl NoteCanvasApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let Some(storage) = cc.storage else {
            return Self::default();
        };

        let brush = eframe::get_value::<Brush>(storage, BRUSH_KEY).unwrap_or_default();
        let strokes = storage
            .get_string(STROKES_KEY)
            .and_then(|json| match StrokeDocument::from_json(&json) {
                Ok(document) => Some(document.strokes),
                Err(e) => {
                    log::error!("Discarding saved strokes: {e}");
                    None
                }
            })
            .unwrap_or_default();

        Self::with_state(brush, strokes)
    }

    fn with_state(brush: Brush, strokes: Vec<Stroke>) -> Self {
        let picked_color = Rc::new(Cell::new(None));
        let mut canvas = CanvasController::new();
        let sink = Rc::clone(&picked_color);
        canvas.set_on_color_picked(move |color| sink.set(Some(color)));
        canvas.set_brush(Some(brush.clone()));
        canvas.load_strokes(strokes);

        Self {
            canvas,
            brush,
            drawing_enabled: true,
            picked_color,
            texture: None,
            status: None,
        }
    }

    fn sync_brush(&mut self) {
        let brush = self.drawing_enabled.then(|| self.brush.clone());
        self.canvas.set_brush(brush);
    }

    fn tools_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tools_panel")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Brush");

                let mut changed = false;
                egui::ComboBox::from_label("Kind")
                    .selected_text(self.brush.kind.name())
                    .show_ui(ui, |ui| {
                        for kind in BrushKind::ALL {
                            changed |= ui
                                .selectable_value(&mut self.brush.kind, kind, kind.name())
                                .changed();
                        }
                    });

                let mut color = brush::parse_color_or_black(&self.brush.color_hex);
                ui.horizontal(|ui| {
                    ui.label("Colour");
                    if ui.color_edit_button_srgba(&mut color).changed() {
                        self.brush.color_hex = brush::color_to_hex(color);
                        changed = true;
                    }
                });
                let widths = MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH;
                changed |= ui
                    .add(egui::Slider::new(&mut self.brush.stroke_width, widths).text("Width"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut self.brush.opacity, 0.0..=1.0).text("Opacity"))
                    .changed();
                changed |= ui.checkbox(&mut self.drawing_enabled, "Drawing enabled").changed();
                if changed {
                    self.sync_brush();
                }

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Undo").clicked() {
                        self.canvas.undo();
                    }
                    if ui.button("Clear").clicked() {
                        self.canvas.clear();
                    }
                });

                let mut zoom = self.canvas.is_zoom_enabled();
                if ui.checkbox(&mut zoom, "Zoom / pan").changed() {
                    self.canvas.set_zoom(zoom);
                }
                let mut eyedropper = self.canvas.is_eyedropper_enabled();
                if ui.checkbox(&mut eyedropper, "Eyedropper").changed() {
                    self.canvas.set_eyedropper(eyedropper);
                }

                ui.separator();

                if ui.button("Export PNG").clicked() {
                    let path = std::env::temp_dir().join("note_canvas.png");
                    self.status = Some(match self.canvas.export_png(&path) {
                        Ok(()) => format!("Saved {}", path.display()),
                        Err(e) => {
                            log::error!("Export failed: {e}");
                            format!("Export failed: {e}")
                        }
                    });
                }

                ui.label(format!("Strokes: {}", self.canvas.stroke_count()));
                if let Some(status) = &self.status {
                    ui.label(status);
                }
            });
    }

    fn canvas_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let available = ui.available_size();
                let height = available.y.max(self.canvas.min_height());
                let (response, painter) =
                    ui.allocate_painter(egui::vec2(available.x, height), Sense::click_and_drag());
                let rect = response.rect;

                self.canvas
                    .resize(rect.width().round() as u32, rect.height().round() as u32);

                for event in pointer_events(ctx, &response, rect, &self.canvas) {
                    self.canvas.handle_event(event);
                }
                if self.canvas.take_relayout_request() {
                    ctx.request_repaint();
                }
                if let Some(color) = self.picked_color.take() {
                    self.brush.color_hex = brush::color_to_hex(color);
                    self.sync_brush();
                }

                if let Some(image) = self.canvas.frame_image() {
                    match &mut self.texture {
                        Some(texture) => texture.set(image, TextureOptions::LINEAR),
                        None => {
                            self.texture =
                                Some(ctx.load_texture("canvas", image, TextureOptions::LINEAR));
                        }
                    }
                }
                if let Some(texture) = &self.texture {
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    let screen_rect = self.canvas.view().screen_rect(rect);
                    painter.image(texture.id(), screen_rect, uv, Color32::WHITE);
                }
                if let Some((path, paint)) = self.canvas.live_stroke() {
                    let points = path.points().iter().map(|p| rect.min + p.to_vec2()).collect();
                    let [r, g, b, _] = paint.color.to_srgba_unmultiplied();
                    let color = Color32::from_rgba_unmultiplied(r, g, b, paint.alpha);
                    painter.add(egui::Shape::line(points, egui::Stroke::new(paint.width, color)));
                }
            });
        });
    }
}

/// Canvas-space position of a screen point. Panning runs on raw screen
/// offsets; picks and strokes see through the current zoom and pan.
fn canvas_position(canvas: &CanvasController, screen_pos: Pos2, rect: Rect) -> Pos2 {
    let pos = if canvas.is_zoom_enabled() && !canvas.is_eyedropper_enabled() {
        screen_pos
    } else {
        canvas.view().to_canvas(screen_pos, rect)
    };
    (pos - rect.min).to_pos2()
}

/// Translate this frame's drag on the canvas into canvas-space events
fn pointer_events(
    ctx: &egui::Context,
    response: &egui::Response,
    rect: Rect,
    canvas: &CanvasController,
) -> Vec<InputEvent> {
    let mut events = Vec::new();

    let zoom = ctx.input(|i| i.zoom_delta());
    if zoom != 1.0 && response.hovered() {
        events.push(InputEvent::Pinch { scale_factor: zoom });
    }

    let Some(screen_pos) = response
        .interact_pointer_pos()
        .or_else(|| ctx.input(|i| i.pointer.latest_pos()))
    else {
        return events;
    };
    let pos = canvas_position(canvas, screen_pos, rect);
    let pointer_id = 0;

    if response.drag_started() {
        events.push(InputEvent::PointerDown { pos, pointer_id });
    } else if response.drag_stopped() {
        events.push(InputEvent::PointerUp { pos, pointer_id });
    } else if response.dragged() {
        events.push(InputEvent::PointerMove { pos, pointer_id });
    } else if response.clicked() {
        events.push(InputEvent::PointerDown { pos, pointer_id });
        events.push(InputEvent::PointerUp { pos, pointer_id });
    }
    events
}

impl eframe::App for NoteCanvasApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, BRUSH_KEY, &self.brush);
        match StrokeDocument::new(self.canvas.get_strokes()).to_json() {
            Ok(json) => storage.set_string(STROKES_KEY, json),
            Err(e) => log::error!("Failed to save strokes: {e}"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tools_panel(ctx);
        self.canvas_panel(ctx);
    }
}
