mod environment;
pub mod error;
mod extractors;
pub mod image;

pub use environment::{Environment, MediaDriver};
pub use error::AppError;
pub use extractors::{ImageUpload, PlantUpload, ValidatedPlantUpload};
