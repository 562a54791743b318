use tracing::{error, info, warn};

use crate::api::{PlantView, PlantsApi};

/// One row of the "my plants" list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantItem {
    pub plant: PlantView,
    /// Mirrors `posted`, flipped locally after post and remove actions
    pub is_posted: bool,
}

impl From<PlantView> for PlantItem {
    fn from(plant: PlantView) -> Self {
        Self {
            is_posted: plant.plant.posted,
            plant,
        }
    }
}

/// State of the "my plants" list screen
///
/// Actions address plants by their index in the list. Rows only change once the API
/// confirms the action; failures are logged and leave the row as it was.
pub struct MyPlantsScreen<A> {
    api: A,
    items: Vec<PlantItem>,
}

impl<A: PlantsApi> MyPlantsScreen<A> {
    pub const fn new(api: A) -> Self {
        Self {
            api,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[PlantItem] {
        &self.items
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Loads the caller's plants, replacing the list
    pub async fn mount(&mut self) {
        match self.api.list_mine().await {
            Ok(plants) => {
                self.items = plants.into_iter().map(PlantItem::from).collect();
                info!(count = self.items.len(), "Loaded plants");
            }
            Err(err) => error!("Failed to load plants: {err}"),
        }
    }

    /// Posts the plant at `index` to the public feed
    pub async fn post_at(&mut self, index: usize) {
        self.set_posted_at(index, true).await;
    }

    /// Withdraws the plant at `index` from the public feed
    pub async fn remove_at(&mut self, index: usize) {
        self.set_posted_at(index, false).await;
    }

    /// Deletes the plant at `index`, dropping the row once the API confirms
    pub async fn delete_at(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else {
            warn!(index, "No plant at index");
            return;
        };

        match self.api.delete_plant(&item.plant.plant.id).await {
            Ok(message) => {
                info!(plant_id = %item.plant.plant.id, "{message}");
                self.items.remove(index);
            }
            Err(err) => error!(plant_id = %item.plant.plant.id, "Failed to delete plant: {err}"),
        }
    }

    async fn set_posted_at(&mut self, index: usize, posted: bool) {
        let Some(item) = self.items.get_mut(index) else {
            warn!(index, "No plant at index");
            return;
        };

        let result = if posted {
            self.api.post_plant(&item.plant.plant.id).await
        } else {
            self.api.remove_plant(&item.plant.plant.id).await
        };

        match result {
            Ok(_) => item.is_posted = posted,
            Err(err) => {
                error!(plant_id = %item.plant.plant.id, posted, "Failed to update plant: {err}");
            }
        }
    }
}
