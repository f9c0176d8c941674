#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod background;
pub mod brush;
pub mod canvas;
pub mod command;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod layer;
pub mod path_sampler;
pub mod persistence;
pub mod stroke;
pub mod view;

pub use app::NoteCanvasApp;
pub use background::Background;
pub use brush::{Brush, BrushKind, PaintSpec};
pub use canvas::CanvasController;
pub use command::Command;
pub use config::CanvasConfig;
pub use error::CanvasError;
pub use input::{InputEvent, InputState, InputStateMachine};
pub use layer::LayerCompositor;
pub use path_sampler::{PathSampler, Polyline};
pub use persistence::StrokeDocument;
pub use stroke::Stroke;
pub use view::ViewTransform;
