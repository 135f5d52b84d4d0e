pub mod block;
pub mod colour;
pub mod command;
pub mod db;
pub mod error;
pub mod generator;
pub mod plot;
pub mod pos;
pub mod session;
pub mod settings;
pub mod world;
pub mod world_handler;

pub use error::{PlotError, Result};
