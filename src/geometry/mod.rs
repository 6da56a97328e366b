pub mod contour;
pub mod dash;
pub mod outline;

pub use contour::{ALPHA_THRESHOLD, AlphaMask, trace_contour};
pub use dash::DashPattern;
pub use outline::{CornerRadii, Outline, surface_frame};
