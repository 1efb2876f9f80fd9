pub mod commands;
pub mod model;

pub use model::{CreateRequirementCommand, Requirement};
