//! Priority event dispatch and the lifecycle vocabulary fired through it.

pub mod bus;
pub mod lifecycle;

pub use bus::{DEFAULT_PRIORITY, EventBus, Handler, HandlerResult, handler};
pub use lifecycle::Lifecycle;
