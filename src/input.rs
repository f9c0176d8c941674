use egui::Pos2;
use log::debug;

use crate::brush::Brush;
use crate::command::Command;
use crate::layer::LayerCompositor;
use crate::path_sampler::{PathSampler, Polyline};
use crate::stroke::Stroke;

/// Distance from the bottom edge that triggers canvas growth
pub const DEFAULT_EXPAND_MARGIN: f32 = 200.0;

/// Pointer input in untransformed canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2, pointer_id: u64 },
    PointerMove { pos: Pos2, pointer_id: u64 },
    PointerUp { pos: Pos2, pointer_id: u64 },
    PointerCancel { pointer_id: u64 },
    /// Two-finger pinch; `scale_factor` is relative to the previous event
    Pinch { scale_factor: f32 },
}

impl InputEvent {
    pub fn pointer_id(&self) -> Option<u64> {
        match self {
            InputEvent::PointerDown { pointer_id, .. }
            | InputEvent::PointerMove { pointer_id, .. }
            | InputEvent::PointerUp { pointer_id, .. }
            | InputEvent::PointerCancel { pointer_id } => Some(*pointer_id),
            InputEvent::Pinch { .. } => None,
        }
    }
}

/// What the machine needs from its owner for one event
pub struct CanvasSurface<'a> {
    pub layers: &'a mut LayerCompositor,
    pub strokes: &'a [Stroke],
    pub width: u32,
    pub height: u32,
}

impl CanvasSurface<'_> {
    fn ensure_buffers(&mut self) -> bool {
        self.layers
            .ensure_buffers_initialized(self.width, self.height, self.strokes)
    }
}

/// Result of feeding one event to the machine
#[derive(Debug, Default, PartialEq)]
pub struct EventOutcome {
    /// Whether the event belonged to the canvas
    pub consumed: bool,
    pub command: Option<Command>,
}

impl EventOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn consumed() -> Self {
        Self {
            consumed: true,
            command: None,
        }
    }

    fn with_command(command: Command) -> Self {
        Self {
            consumed: true,
            command: Some(command),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Idle,
    Drawing { eraser: bool },
}

#[derive(Debug, Clone)]
struct Gesture {
    pointer_id: u64,
    path: Polyline,
    brush: Brush,
}

/// Turns pointer events into live paths, eraser previews and committed strokes.
///
/// Only the pointer that started a gesture can extend or end it; any other
/// pointer is ignored until the gesture is over.
#[derive(Debug, Clone)]
pub struct InputStateMachine {
    gesture: Option<Gesture>,
    sampler: PathSampler,
    expand_margin: f32,
    divider_y: f32,
}

impl Default for InputStateMachine {
    fn default() -> Self {
        Self::new(PathSampler::default(), DEFAULT_EXPAND_MARGIN)
    }
}

impl InputStateMachine {
    pub fn new(sampler: PathSampler, expand_margin: f32) -> Self {
        Self {
            gesture: None,
            sampler,
            expand_margin,
            divider_y: 0.0,
        }
    }

    pub fn state(&self) -> InputState {
        match &self.gesture {
            None => InputState::Idle,
            Some(gesture) => InputState::Drawing {
                eraser: gesture.brush.is_eraser(),
            },
        }
    }

    /// The path of the gesture in progress
    pub fn current_path(&self) -> Option<&Polyline> {
        self.gesture.as_ref().map(|gesture| &gesture.path)
    }

    /// Brush of the gesture in progress
    pub fn current_brush(&self) -> Option<&Brush> {
        self.gesture.as_ref().map(|gesture| &gesture.brush)
    }

    /// Gestures may only start at or below `y`; `0` disables the limit
    pub fn set_divider_y(&mut self, y: f32) {
        self.divider_y = y;
    }

    pub fn divider_y(&self) -> f32 {
        self.divider_y
    }

    pub fn on_event(
        &mut self,
        event: InputEvent,
        brush: Option<&Brush>,
        surface: &mut CanvasSurface<'_>,
    ) -> EventOutcome {
        match event {
            InputEvent::PointerDown { pos, pointer_id } => {
                self.on_pointer_down(pos, pointer_id, brush, surface)
            }
            InputEvent::PointerMove { pos, pointer_id } => {
                self.on_pointer_move(pos, pointer_id, surface)
            }
            InputEvent::PointerUp { pointer_id, .. } | InputEvent::PointerCancel { pointer_id } => {
                self.on_pointer_up(pointer_id, surface)
            }
            InputEvent::Pinch { .. } => EventOutcome::ignored(),
        }
    }

    pub fn on_pointer_down(
        &mut self,
        pos: Pos2,
        pointer_id: u64,
        brush: Option<&Brush>,
        surface: &mut CanvasSurface<'_>,
    ) -> EventOutcome {
        let Some(brush) = brush else {
            return EventOutcome::ignored();
        };
        if self.gesture.is_some() {
            // Extra fingers belong to zoom/pan, not to the stroke
            return EventOutcome::ignored();
        }
        if self.divider_y > 0.0 && pos.y < self.divider_y {
            return EventOutcome::ignored();
        }

        let mut path = Polyline::new();
        path.move_to(pos);

        if brush.is_eraser() {
            surface.ensure_buffers();
            surface.layers.begin_erase();
        }
        debug!("Gesture started at {pos:?} with {}", brush.kind.name());

        self.gesture = Some(Gesture {
            pointer_id,
            path,
            brush: brush.clone(),
        });
        EventOutcome::consumed()
    }

    pub fn on_pointer_move(
        &mut self,
        pos: Pos2,
        pointer_id: u64,
        surface: &mut CanvasSurface<'_>,
    ) -> EventOutcome {
        let Some(gesture) = self.gesture.as_mut() else {
            return EventOutcome::ignored();
        };
        if gesture.pointer_id != pointer_id {
            return EventOutcome::ignored();
        }

        gesture.path.line_to(pos);
        if gesture.brush.is_eraser() {
            surface.layers.live_erase_step(&gesture.path, &gesture.brush.live_paint());
        }

        if pos.y > surface.height as f32 - self.expand_margin {
            return EventOutcome::with_command(Command::ExpandCanvas {
                min_height: pos.y + self.expand_margin,
            });
        }
        EventOutcome::consumed()
    }

    /// Pointer up and cancel both finish the gesture
    pub fn on_pointer_up(
        &mut self,
        pointer_id: u64,
        surface: &mut CanvasSurface<'_>,
    ) -> EventOutcome {
        match &self.gesture {
            Some(gesture) if gesture.pointer_id == pointer_id => {}
            _ => return EventOutcome::ignored(),
        }
        let Some(gesture) = self.gesture.take() else {
            return EventOutcome::ignored();
        };

        if gesture.brush.is_eraser() {
            surface.layers.commit_erase();
            debug!("Erase gesture committed, no stroke recorded");
            return EventOutcome::consumed();
        }

        surface.ensure_buffers();
        let stroke = Stroke::from_path(&gesture.path, &gesture.brush, &self.sampler);
        debug!("Stroke {} finished with {} points", stroke.id(), gesture.path.points().len());
        EventOutcome::with_command(Command::AddStroke(stroke))
    }

    /// Drop the gesture in progress without committing anything.
    /// Returns whether there was one.
    pub fn cancel(&mut self, layers: &mut LayerCompositor) -> bool {
        match self.gesture.take() {
            Some(gesture) => {
                if gesture.brush.is_eraser() {
                    layers.cancel_erase();
                }
                debug!("Discarded gesture in progress");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushKind;

    fn surface<'a>(layers: &'a mut LayerCompositor, strokes: &'a [Stroke]) -> CanvasSurface<'a> {
        CanvasSurface {
            layers,
            strokes,
            width: 400,
            height: 400,
        }
    }

    #[test]
    fn test_no_brush_ignores_events() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);

        let outcome = machine.on_pointer_down(Pos2::new(1.0, 1.0), 0, None, &mut surface);
        assert!(!outcome.consumed);
        assert_eq!(machine.state(), InputState::Idle);
    }

    #[test]
    fn test_draw_gesture_produces_stroke() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);
        let brush = Brush::new(BrushKind::Pen, "#FF0000", 4.0, 1.0);

        machine.on_pointer_down(Pos2::new(0.0, 0.0), 7, Some(&brush), &mut surface);
        assert_eq!(machine.state(), InputState::Drawing { eraser: false });
        machine.on_pointer_move(Pos2::new(10.0, 0.0), 7, &mut surface);

        let outcome = machine.on_pointer_up(7, &mut surface);
        let Some(Command::AddStroke(stroke)) = outcome.command else {
            panic!("expected a stroke");
        };
        assert_eq!(stroke.path().last(), Some(Pos2::new(10.0, 0.0)));
        assert_eq!(machine.state(), InputState::Idle);
    }

    #[test]
    fn test_other_pointers_are_ignored() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);
        let brush = Brush::default();

        machine.on_pointer_down(Pos2::new(0.0, 0.0), 1, Some(&brush), &mut surface);
        let second = machine.on_pointer_down(Pos2::new(5.0, 5.0), 2, Some(&brush), &mut surface);
        assert!(!second.consumed);
        assert!(!machine.on_pointer_move(Pos2::new(9.0, 9.0), 2, &mut surface).consumed);
        assert!(!machine.on_pointer_up(2, &mut surface).consumed);
        assert_eq!(machine.current_path().unwrap().points().len(), 1);
    }

    #[test]
    fn test_eraser_gesture_records_nothing() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);
        let eraser = Brush::new(BrushKind::HardEraser, "#000000", 10.0, 1.0);

        machine.on_pointer_down(Pos2::new(0.0, 0.0), 0, Some(&eraser), &mut surface);
        assert!(surface.layers.is_erasing());
        machine.on_pointer_move(Pos2::new(10.0, 10.0), 0, &mut surface);
        let outcome = machine.on_pointer_up(0, &mut surface);
        assert!(outcome.consumed);
        assert!(outcome.command.is_none());
        assert!(!surface.layers.is_erasing());
        assert!(surface.layers.has_erased());
    }

    #[test]
    fn test_move_near_bottom_requests_expansion() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);
        let brush = Brush::default();

        machine.on_pointer_down(Pos2::new(0.0, 0.0), 0, Some(&brush), &mut surface);
        let outcome = machine.on_pointer_move(Pos2::new(0.0, 100.0), 0, &mut surface);
        assert_eq!(outcome.command, None);

        let outcome = machine.on_pointer_move(Pos2::new(0.0, 250.0), 0, &mut surface);
        assert_eq!(outcome.command, Some(Command::ExpandCanvas { min_height: 450.0 }));
    }

    #[test]
    fn test_divider_blocks_gestures_above_it() {
        let mut machine = InputStateMachine::default();
        machine.set_divider_y(50.0);
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);
        let brush = Brush::default();

        let above = machine.on_pointer_down(Pos2::new(0.0, 10.0), 0, Some(&brush), &mut surface);
        assert!(!above.consumed);
        let below = machine.on_pointer_down(Pos2::new(0.0, 60.0), 0, Some(&brush), &mut surface);
        assert!(below.consumed);
        // Once started, the gesture may cross the divider
        assert!(machine.on_pointer_move(Pos2::new(0.0, 5.0), 0, &mut surface).consumed);
    }

    #[test]
    fn test_zero_length_gesture_still_commits() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        let mut surface = surface(&mut layers, &[]);
        let brush = Brush::default();

        machine.on_pointer_down(Pos2::new(3.0, 3.0), 0, Some(&brush), &mut surface);
        let outcome = machine.on_pointer_up(0, &mut surface);
        let Some(Command::AddStroke(stroke)) = outcome.command else {
            panic!("expected a stroke");
        };
        assert_eq!(stroke.geometry(), "");
    }

    #[test]
    fn test_cancel_drops_erase_preview() {
        let mut machine = InputStateMachine::default();
        let mut layers = LayerCompositor::default();
        {
            let mut surface = surface(&mut layers, &[]);
            let eraser = Brush::new(BrushKind::SoftEraser, "#000000", 10.0, 0.5);
            machine.on_pointer_down(Pos2::new(0.0, 0.0), 0, Some(&eraser), &mut surface);
        }
        assert!(machine.cancel(&mut layers));
        assert!(!layers.is_erasing());
        assert!(!layers.has_erased());
        assert!(!machine.cancel(&mut layers));
    }
}
