pub mod batch;
pub mod camera_model;
pub mod database;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod scaffold;
pub mod sparse;
pub mod types;
pub mod writer;

pub use error::{PrepError, Result};
