//! `presupro-events` — the event contract shared by all domain crates.

pub mod event;
pub mod replay;

pub use event::Event;
pub use replay::{execute, replay};
