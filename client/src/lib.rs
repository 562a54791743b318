//! Client for the Plant API
//!
//! [`PlantsApiClient`] talks to the backend over HTTP. [`MyPlantsScreen`] holds the state of
//! the "my plants" list: it loads the caller's plants and keeps the list in step with the
//! post, remove and delete actions.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![allow(clippy::module_name_repetitions)]

mod api;
mod error;
mod screen;

pub use api::{ImageFile, NewPlant, PlantView, PlantsApi, PlantsApiClient};
pub use error::{ClientError, ClientResult};
pub use screen::{MyPlantsScreen, PlantItem};
