mod logger;
mod position;

pub use crate::{Log, Position};
