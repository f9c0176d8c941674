use egui::{Color32, ColorImage};
use log::{debug, info, warn};
use tiny_skia::{Pixmap, PixmapRef};

use crate::background::Background;
use crate::brush::{Brush, PaintSpec};
use crate::command::Command;
use crate::config::CanvasConfig;
use crate::error::{CanvasError, CanvasResult};
use crate::export;
use crate::input::{CanvasSurface, InputEvent, InputState, InputStateMachine};
use crate::layer::{self, LayerCompositor};
use crate::path_sampler::{PathSampler, Polyline};
use crate::stroke::Stroke;
use crate::view::ViewTransform;

/// Called with the sampled colour when the eyedropper picks
pub type ColorPickedCallback = Box<dyn FnMut(Color32)>;

/// Public surface of the drawing engine.
///
/// Owns the stroke list and the layer compositor, routes pointer input to
/// the eyedropper, the zoom/pan view or the drawing state machine (in that
/// priority), and exposes the frame to present.
pub struct CanvasController {
    config: CanvasConfig,
    brush: Option<Brush>,
    strokes: Vec<Stroke>,
    layers: LayerCompositor,
    input: InputStateMachine,
    view: ViewTransform,
    zoom_enabled: bool,
    eyedropper_enabled: bool,
    on_color_picked: Option<ColorPickedCallback>,
    width: u32,
    height: u32,
    min_height: f32,
    relayout_requested: bool,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CanvasController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasController")
            .field("brush", &self.brush)
            .field("strokes", &self.strokes.len())
            .field("layers", &self.layers)
            .field("input", &self.input.state())
            .field("zoom_enabled", &self.zoom_enabled)
            .field("eyedropper_enabled", &self.eyedropper_enabled)
            .field("size", &(self.width, self.height))
            .finish_non_exhaustive()
    }
}

impl CanvasController {
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        let config = config.validated();
        Self {
            input: InputStateMachine::new(
                PathSampler::new(config.sample_step),
                config.expand_margin,
            ),
            view: ViewTransform::new(config.min_zoom, config.max_zoom),
            config,
            brush: None,
            strokes: Vec::new(),
            layers: LayerCompositor::default(),
            zoom_enabled: false,
            eyedropper_enabled: false,
            on_color_picked: None,
            width: 0,
            height: 0,
            min_height: 0.0,
            relayout_requested: false,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Set the active brush. `None` disables drawing and drops any gesture
    /// in progress.
    pub fn set_brush(&mut self, brush: Option<Brush>) {
        self.brush = brush.map(|mut brush| {
            if brush.stroke_width.is_nan() {
                brush.stroke_width = self.config.min_stroke_width;
            }
            brush.stroke_width = brush
                .stroke_width
                .clamp(self.config.min_stroke_width, self.config.max_stroke_width);
            brush
        });
        if self.brush.is_none() {
            self.input.cancel(&mut self.layers);
        }
    }

    pub fn brush(&self) -> Option<&Brush> {
        self.brush.as_ref()
    }

    pub fn set_background(&mut self, background: Background) {
        self.layers.set_background(background);
    }

    pub fn background(&self) -> &Background {
        self.layers.background()
    }

    /// Only allow gestures to start at or below `y`; `0` removes the limit
    pub fn set_divider_y(&mut self, y: f32) {
        self.input.set_divider_y(y);
    }

    /// Lay the canvas out at a new size. Buffers follow on the next render.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            debug!("Canvas resized to {width}x{height}");
        }
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Height the canvas asked to grow to while drawing near its bottom edge
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Whether the host should lay the canvas out again; clears the request
    pub fn take_relayout_request(&mut self) -> bool {
        std::mem::take(&mut self.relayout_requested)
    }

    pub fn input_state(&self) -> InputState {
        self.input.state()
    }

    /// Path and paint of a drawing gesture in progress, for the host to draw
    /// on top of the frame. Erase gestures are previewed in the frame itself.
    pub fn live_stroke(&self) -> Option<(&Polyline, PaintSpec)> {
        let brush = self.input.current_brush().filter(|brush| !brush.is_eraser())?;
        let path = self.input.current_path()?;
        Some((path, brush.live_paint()))
    }

    /// Feed one pointer event. Returns whether the canvas consumed it.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        if self.eyedropper_enabled {
            return self.handle_eyedropper_event(event);
        }
        if self.zoom_enabled {
            return self.handle_view_event(event);
        }

        let mut surface = CanvasSurface {
            layers: &mut self.layers,
            strokes: &self.strokes,
            width: self.width,
            height: self.height,
        };
        let outcome = self.input.on_event(event, self.brush.as_ref(), &mut surface);
        if let Some(command) = outcome.command {
            self.execute(command);
        }
        outcome.consumed
    }

    fn execute(&mut self, command: Command) {
        debug!("Executing {}", command.name());
        match command {
            Command::AddStroke(stroke) => {
                self.layers.commit_draw(&stroke);
                self.strokes.push(stroke);
            }
            Command::ExpandCanvas { min_height } => {
                if min_height > self.min_height {
                    self.min_height = min_height;
                    self.relayout_requested = true;
                }
            }
        }
    }

    fn handle_eyedropper_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { pos, .. } | InputEvent::PointerUp { pos, .. } => {
                let color = self.get_color_at(pos.x as i32, pos.y as i32);
                if let Some(callback) = self.on_color_picked.as_mut() {
                    callback(color);
                }
                self.set_eyedropper(false);
            }
            _ => {}
        }
        true
    }

    fn handle_view_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Pinch { scale_factor } => self.view.pinch(scale_factor),
            InputEvent::PointerDown { pos, .. } => self.view.begin_pan(pos),
            InputEvent::PointerMove { pos, .. } => self.view.pan_to(pos),
            InputEvent::PointerUp { .. } | InputEvent::PointerCancel { .. } => self.view.end_pan(),
        }
        true
    }

    /// Remove every stroke and release all buffers
    pub fn clear(&mut self) {
        self.input.cancel(&mut self.layers);
        self.strokes.clear();
        self.layers.release();
        info!("Canvas cleared");
    }

    /// Undo the most recent drawing action.
    ///
    /// A gesture in progress is discarded first. Otherwise the latest
    /// non-eraser stroke leaves the list; the committed layer is rebuilt
    /// from the remaining strokes unless erasing has modified it, in which
    /// case the pixels stay as they are because erasing cannot be replayed.
    pub fn undo(&mut self) -> bool {
        if self.input.cancel(&mut self.layers) {
            return true;
        }
        let Some(index) = self.strokes.iter().rposition(|stroke| !stroke.is_eraser()) else {
            return false;
        };
        let removed = self.strokes.remove(index);

        if self.layers.has_erased() {
            warn!(
                "Undo removed stroke {} after erasing; pixels kept",
                removed.id()
            );
        } else if self.layers.size().is_some() {
            self.layers.rebuild(self.width, self.height, &self.strokes);
        }
        true
    }

    /// Copy of the committed stroke list for persistence
    pub fn get_strokes(&self) -> Vec<Stroke> {
        self.strokes.clone()
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// Replace the stroke list; buffers are rebuilt on the next render
    pub fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        self.input.cancel(&mut self.layers);
        self.strokes = strokes;
        self.layers.release();
        info!("Loaded {} strokes", self.strokes.len());
    }

    /// Make sure buffers match the current size and return the frame to
    /// present: the erase preview while erasing, the committed layer
    /// otherwise. `None` until the canvas has a drawable size.
    pub fn render_frame(&mut self) -> Option<PixmapRef<'_>> {
        self.layers
            .ensure_buffers_initialized(self.width, self.height, &self.strokes);
        self.layers.render_frame()
    }

    /// The presented frame as an egui image, ready for texture upload
    pub fn frame_image(&mut self) -> Option<ColorImage> {
        self.render_frame().map(layer::frame_to_color_image)
    }

    /// Colour of the presented frame at a pixel; black when out of bounds or
    /// before any buffer exists
    pub fn get_color_at(&mut self, x: i32, y: i32) -> Color32 {
        self.layers.refresh_result();
        self.layers.color_at(x, y)
    }

    /// While enabled, the next pointer down or up picks a colour and turns the
    /// mode off again
    pub fn set_eyedropper(&mut self, enabled: bool) {
        self.eyedropper_enabled = enabled;
        if enabled {
            self.layers.refresh_result();
        }
    }

    pub fn is_eyedropper_enabled(&self) -> bool {
        self.eyedropper_enabled
    }

    pub fn set_on_color_picked(&mut self, callback: impl FnMut(Color32) + 'static) {
        self.on_color_picked = Some(Box::new(callback));
    }

    /// Zoom mode and drawing exclude each other: turning zoom on drops the
    /// gesture in progress, turning it off resets the view.
    pub fn set_zoom(&mut self, enabled: bool) {
        if enabled {
            self.input.cancel(&mut self.layers);
        } else {
            self.view.reset();
        }
        self.zoom_enabled = enabled;
    }

    pub fn is_zoom_enabled(&self) -> bool {
        self.zoom_enabled
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Flattened copy of the drawing. Without a drawable size the strokes
    /// are rendered onto a square of the configured fallback size.
    pub fn drawing_bitmap(&self) -> Option<Pixmap> {
        if let Some(frame) = self.layers.render_frame() {
            return Some(frame.to_owned());
        }

        let (width, height) = if self.width > 0 && self.height > 0 {
            (self.width, self.height)
        } else {
            (self.config.fallback_export_size, self.config.fallback_export_size)
        };
        let mut scratch = LayerCompositor::new(self.layers.background().clone());
        if !scratch.ensure_buffers_initialized(width, height, &self.strokes) {
            return None;
        }
        scratch.render_frame().map(|frame| frame.to_owned())
    }

    /// Write the flattened drawing as a PNG file
    pub fn export_png(&self, path: impl AsRef<std::path::Path>) -> CanvasResult<()> {
        let bitmap = self.drawing_bitmap().ok_or(CanvasError::EmptyCanvas)?;
        export::save_png(bitmap.as_ref(), path)
    }
}
