pub mod board;
pub mod bounds;
pub mod commands;
pub mod config;
pub mod geometry;
pub mod history;
pub mod id;
pub mod input;
pub mod queue;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod style;

pub use board::Whiteboard;
pub use id::Id;
