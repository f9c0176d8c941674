use egui::{Color32, ColorImage};
use log::{debug, info, warn};
use tiny_skia::{
    BlendMode, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, PixmapRef,
    Stroke as SkStroke, StrokeDash, Transform,
};

use crate::background::Background;
use crate::brush::{Blend, PaintSpec};
use crate::path_sampler::Polyline;
use crate::stroke::Stroke;

/// Owns the raster buffers of the canvas and composites strokes into them.
///
/// * `committed` - authoritative image: background, every finished stroke and
///   the cumulative effect of all erasing.
/// * `scratch` - live erase preview, only meaningful while erasing.
/// * `result` - snapshot of the presented frame, used for colour sampling.
///
/// All three always share one size. Erasing is destructive: once committed it
/// cannot be reconstructed from the stroke list.
pub struct LayerCompositor {
    committed: Option<Pixmap>,
    scratch: Option<Pixmap>,
    result: Option<Pixmap>,
    background: Background,
    erasing: bool,
    erased_since_rebuild: bool,
}

impl Default for LayerCompositor {
    fn default() -> Self {
        Self::new(Background::default())
    }
}

impl std::fmt::Debug for LayerCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerCompositor")
            .field("size", &self.size())
            .field("background", &self.background)
            .field("erasing", &self.erasing)
            .field("erased_since_rebuild", &self.erased_since_rebuild)
            .finish()
    }
}

impl LayerCompositor {
    pub fn new(background: Background) -> Self {
        Self {
            committed: None,
            scratch: None,
            result: None,
            background,
            erasing: false,
            erased_since_rebuild: false,
        }
    }

    /// Size of the committed layer, if allocated
    pub fn size(&self) -> Option<(u32, u32)> {
        self.committed.as_ref().map(|layer| (layer.width(), layer.height()))
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Swap the background. The committed layer is rebuilt from the stroke
    /// list on the next initialisation, so erased pixels come back.
    pub fn set_background(&mut self, background: Background) {
        if self.erased_since_rebuild {
            warn!("Background change rebuilds the committed layer; erasing is lost");
        }
        self.background = background;
        self.committed = None;
    }

    pub fn is_erasing(&self) -> bool {
        self.erasing
    }

    /// True when erasing has modified the committed layer since it was last
    /// rebuilt from the stroke list
    pub fn has_erased(&self) -> bool {
        self.erased_since_rebuild
    }

    /// Allocate every missing or wrong-sized buffer. A freshly allocated
    /// committed layer gets the background plus every non-eraser stroke in
    /// list order; an existing committed layer of the right size is left
    /// alone. Returns `false` when the size is not drawable.
    pub fn ensure_buffers_initialized(
        &mut self,
        width: u32,
        height: u32,
        strokes: &[Stroke],
    ) -> bool {
        if width == 0 || height == 0 {
            return false;
        }

        if !has_size(&self.committed, width, height) {
            let Some(mut layer) = Pixmap::new(width, height) else {
                warn!("Could not allocate committed layer of {width}x{height}");
                return false;
            };
            self.background.paint_onto(&mut layer);
            let mut replayed = 0;
            for stroke in strokes.iter().filter(|stroke| !stroke.is_eraser()) {
                draw_polyline(&mut layer, &stroke.path(), &stroke.to_paint());
                replayed += 1;
            }
            info!("Rebuilt committed layer {width}x{height} from {replayed} strokes");
            self.committed = Some(layer);
            self.erased_since_rebuild = false;
        }

        if !has_size(&self.scratch, width, height) {
            self.scratch = Pixmap::new(width, height);
            if self.erasing {
                // Resized mid-gesture; the next live step re-seeds from the new layer
                self.seed_scratch();
            }
        }

        if !has_size(&self.result, width, height) {
            self.result = Pixmap::new(width, height);
        }

        true
    }

    /// Drop every buffer; the next initialisation rebuilds from strokes
    pub fn release(&mut self) {
        self.committed = None;
        self.scratch = None;
        self.result = None;
        self.erasing = false;
        self.erased_since_rebuild = false;
        debug!("Released layer buffers");
    }

    /// Force a replay of the stroke list into a fresh committed layer
    pub fn rebuild(&mut self, width: u32, height: u32, strokes: &[Stroke]) -> bool {
        self.committed = None;
        self.ensure_buffers_initialized(width, height, strokes)
    }

    /// Start an erase gesture by seeding the scratch buffer with the
    /// committed layer
    pub fn begin_erase(&mut self) {
        if self.committed.is_none() || self.scratch.is_none() {
            debug!("begin_erase without buffers, ignoring");
            return;
        }
        self.seed_scratch();
        self.erasing = true;
    }

    /// Draw the whole in-progress erase path into the scratch buffer with
    /// destination-out blending. The scratch buffer is re-seeded first so the
    /// path is applied exactly once.
    ///
    /// Each step copies the full committed layer, so a move costs one
    /// buffer copy plus one stroke of the whole path.
    pub fn live_erase_step(&mut self, path: &Polyline, eraser: &PaintSpec) {
        if !self.erasing {
            return;
        }
        self.seed_scratch();
        if let Some(scratch) = self.scratch.as_mut() {
            let paint = PaintSpec {
                blend: Blend::DestinationOut,
                ..eraser.clone()
            };
            draw_polyline(scratch, path, &paint);
        }
    }

    /// Replace the committed layer with the erase preview, laid over the
    /// background so erased pixels show the background instead of
    /// transparency. Not reversible.
    pub fn commit_erase(&mut self) {
        if !self.erasing {
            return;
        }
        self.erasing = false;

        let (Some(committed), Some(scratch)) = (self.committed.as_mut(), self.scratch.as_ref())
        else {
            return;
        };
        if committed.width() != scratch.width() || committed.height() != scratch.height() {
            warn!("Scratch buffer size differs from committed layer, dropping erase");
            return;
        }

        self.background.paint_onto(committed);
        committed.draw_pixmap(
            0,
            0,
            scratch.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        self.erased_since_rebuild = true;
        debug!("Committed erase");
    }

    /// Abandon an erase gesture without touching the committed layer
    pub fn cancel_erase(&mut self) {
        self.erasing = false;
    }

    /// Bake a finished stroke into the committed layer with normal blending
    pub fn commit_draw(&mut self, stroke: &Stroke) {
        if stroke.is_eraser() {
            warn!("Eraser stroke {} is never drawn as paint", stroke.id());
            return;
        }
        if let Some(committed) = self.committed.as_mut() {
            draw_polyline(committed, &stroke.path(), &stroke.to_paint());
        }
    }

    /// The frame to present: the scratch buffer while erasing, otherwise the
    /// committed layer
    pub fn render_frame(&self) -> Option<PixmapRef<'_>> {
        if self.erasing {
            if let Some(scratch) = self.scratch.as_ref() {
                return Some(scratch.as_ref());
            }
        }
        self.committed.as_ref().map(Pixmap::as_ref)
    }

    /// Copy the presented frame into the result buffer
    pub fn refresh_result(&mut self) {
        let frame = if self.erasing { self.scratch.as_ref() } else { self.committed.as_ref() };
        if let (Some(frame), Some(result)) = (frame, self.result.as_mut()) {
            if frame.data().len() == result.data().len() {
                result.data_mut().copy_from_slice(frame.data());
            }
        }
    }

    /// Colour of the result buffer at a pixel, black when out of range or
    /// nothing has been allocated yet
    pub fn color_at(&self, x: i32, y: i32) -> Color32 {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return Color32::BLACK;
        };
        self.result
            .as_ref()
            .and_then(|result| result.pixel(x, y))
            .map(|pixel| {
                let pixel = pixel.demultiply();
                Color32::from_rgba_unmultiplied(
                    pixel.red(),
                    pixel.green(),
                    pixel.blue(),
                    pixel.alpha(),
                )
            })
            .unwrap_or(Color32::BLACK)
    }

    fn seed_scratch(&mut self) {
        if let (Some(committed), Some(scratch)) = (self.committed.as_ref(), self.scratch.as_mut()) {
            if committed.data().len() == scratch.data().len() {
                scratch.data_mut().copy_from_slice(committed.data());
            } else {
                scratch.fill(tiny_skia::Color::TRANSPARENT);
            }
        }
    }
}

/// Convert a presented frame into an egui image for upload as a texture
pub fn frame_to_color_image(frame: PixmapRef<'_>) -> ColorImage {
    let size = [frame.width() as usize, frame.height() as usize];
    ColorImage::from_rgba_premultiplied(size, frame.data())
}

/// Stroke a polyline onto a pixmap. Polylines with fewer than two points
/// draw nothing.
pub(crate) fn draw_polyline(pixmap: &mut Pixmap, path: &Polyline, spec: &PaintSpec) {
    let points = path.points();
    let Some((origin, rest)) = points.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }

    let mut builder = PathBuilder::new();
    builder.move_to(origin.x, origin.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    let Some(sk_path) = builder.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    let [r, g, b, _] = spec.color.to_srgba_unmultiplied();
    paint.set_color_rgba8(r, g, b, spec.alpha);
    paint.blend_mode = match spec.blend {
        Blend::SourceOver => BlendMode::SourceOver,
        Blend::DestinationOut => BlendMode::DestinationOut,
    };

    let stroke = SkStroke {
        width: spec.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: spec.dash.and_then(|[on, off]| StrokeDash::new(vec![on, off], 0.0)),
        ..SkStroke::default()
    };

    pixmap.stroke_path(&sk_path, &paint, &stroke, Transform::identity(), None);
}

fn has_size(buffer: &Option<Pixmap>, width: u32, height: u32) -> bool {
    buffer
        .as_ref()
        .is_some_and(|pixmap| pixmap.width() == width && pixmap.height() == height)
}
