use crate::stroke::Stroke;

/// Effects the input state machine asks its owner to carry out. The
/// controller owns the stroke list and the layout, so these cross back to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a finished stroke to the stroke list and bake it into the
    /// committed layer
    AddStroke(Stroke),
    /// Drawing came close to the bottom edge; grow the canvas to at least
    /// `min_height` and lay it out again
    ExpandCanvas { min_height: f32 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddStroke(_) => "AddStroke",
            Command::ExpandCanvas { .. } => "ExpandCanvas",
        }
    }
}
