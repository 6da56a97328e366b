//! Cooperative single-threaded runtime: a timer-driven event loop and a cancellation flag.

pub mod cancel;
pub mod event_loop;
