pub mod recording;
pub mod surface;

pub use recording::{Recorded, RecordingSurface};
pub use surface::{Painter, Property, RenderCommand, RenderSurface, SharedSurface, StrokeStyle, Target};
