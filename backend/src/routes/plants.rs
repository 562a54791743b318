//! Plant API: upload, list, post to the public feed, withdraw and delete plants

use std::collections::BTreeSet;
use std::sync::Arc;

use aide::axum::{
    routing::{delete, get, patch, post},
    ApiRouter,
};
use axum::{
    extract::{DefaultBodyLimit, Path},
    http::StatusCode,
    middleware, Extension, Json,
};
use plant_storage::{
    plant::{Plant, PlantCreateRequest, PlantStore},
    user::{User, UserStore},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    media_storage::{generate_object_key, MediaStore, PublicStorageUrl, PLANT_IMAGE_PREFIX},
    middleware::{auth_middleware, AuthenticatedUser},
    types::{AppError, PlantUpload, ValidatedPlantUpload},
};

/// Request body cap for plant routes; larger than the image limit so oversized images
/// are reported as validation errors
pub const MAX_UPLOAD_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Plant as returned by the API
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PlantResponse {
    #[serde(flatten)]
    pub plant: Plant,
    /// Public URL of the plant image
    pub image_url: String,
    /// Owner with address, only in the public feed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
}

impl PlantResponse {
    fn new(plant: Plant, storage_url: &PublicStorageUrl) -> Self {
        let image_url = storage_url.url_for(&plant.image_path);
        Self {
            plant,
            image_url,
            owner: None,
        }
    }
}

/// Confirmation message
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Creates the plant routes under `/api/plants`
pub fn handler() -> ApiRouter {
    let public_routes = ApiRouter::new().api_route("/api/plants/all-plants", get(list_all_plants));

    let protected_routes = ApiRouter::new()
        .api_route("/api/plants/create-plant", post(create_plant))
        .api_route("/api/plants/get-user-plants", get(list_user_plants))
        .api_route("/api/plants/post-plant/{id}", patch(post_plant))
        .api_route("/api/plants/remove-plant/{id}", patch(remove_plant))
        .api_route("/api/plants/delete-plant/{id}", delete(delete_plant))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}

/// Create a plant
///
/// Stores the uploaded image under `plants/` and creates a plant owned by the caller,
/// not yet posted to the public feed.
///
/// # Returns
///
/// Returns `201 CREATED` with the created plant
///
/// # Errors
///
/// Returns an error if:
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `422 UNPROCESSABLE_ENTITY` - Missing or invalid fields, or an invalid image
/// - `500 INTERNAL_SERVER_ERROR` - Image or record could not be stored
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn create_plant(
    user: AuthenticatedUser,
    Extension(plant_store): Extension<Arc<dyn PlantStore>>,
    Extension(media_store): Extension<Arc<dyn MediaStore>>,
    Extension(storage_url): Extension<PublicStorageUrl>,
    ValidatedPlantUpload(upload): ValidatedPlantUpload,
) -> Result<(StatusCode, Json<PlantResponse>), AppError> {
    let PlantUpload {
        name,
        description,
        care_advice,
        image,
    } = upload;

    let image_path = generate_object_key(PLANT_IMAGE_PREFIX, image.format.extension());
    media_store
        .put(&image_path, image.bytes, image.format.mime().as_ref())
        .await?;

    let created = plant_store
        .create(PlantCreateRequest {
            owner_id: user.user_id,
            name,
            description,
            care_advice,
            image_path: image_path.clone(),
        })
        .await;

    let plant = match created {
        Ok(plant) => plant,
        Err(err) => {
            // The record never existed, so its image must not outlive the request
            discard_image(media_store.as_ref(), &image_path).await;
            return Err(err.into());
        }
    };

    info!(plant_id = %plant.id, image_path = %plant.image_path, "Plant created");

    Ok((
        StatusCode::CREATED,
        Json(PlantResponse::new(plant, &storage_url)),
    ))
}

/// List the caller's plants
///
/// # Errors
///
/// Returns an error if:
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn list_user_plants(
    user: AuthenticatedUser,
    Extension(plant_store): Extension<Arc<dyn PlantStore>>,
    Extension(storage_url): Extension<PublicStorageUrl>,
) -> Result<Json<Vec<PlantResponse>>, AppError> {
    let plants = plant_store.list_by_owner(&user.user_id).await?;

    Ok(Json(
        plants
            .into_iter()
            .map(|plant| PlantResponse::new(plant, &storage_url))
            .collect(),
    ))
}

/// Post a plant to the public feed
///
/// # Errors
///
/// Returns an error if:
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `403 FORBIDDEN` - The caller does not own the plant
/// - `404 NOT_FOUND` - Plant with the given ID does not exist
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
#[instrument(skip(user, plant_store), fields(user_id = %user.user_id))]
pub async fn post_plant(
    user: AuthenticatedUser,
    Extension(plant_store): Extension<Arc<dyn PlantStore>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    set_posted(plant_store.as_ref(), &user, &id, true).await?;
    Ok(Json(MessageResponse::new("Plant posted")))
}

/// Withdraw a plant from the public feed
///
/// # Errors
///
/// Same as [`post_plant`]
#[instrument(skip(user, plant_store), fields(user_id = %user.user_id))]
pub async fn remove_plant(
    user: AuthenticatedUser,
    Extension(plant_store): Extension<Arc<dyn PlantStore>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    set_posted(plant_store.as_ref(), &user, &id, false).await?;
    Ok(Json(MessageResponse::new("Plant removed")))
}

/// Delete a plant and its image
///
/// The record goes first; the image is removed afterwards and a failure there is only
/// logged, leaving an orphaned object rather than a record without its image.
///
/// # Errors
///
/// Returns an error if:
/// - `401 UNAUTHORIZED` - Invalid or missing authentication
/// - `403 FORBIDDEN` - The caller does not own the plant
/// - `404 NOT_FOUND` - Plant with the given ID does not exist
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
#[instrument(skip(user, plant_store, media_store), fields(user_id = %user.user_id))]
pub async fn delete_plant(
    user: AuthenticatedUser,
    Extension(plant_store): Extension<Arc<dyn PlantStore>>,
    Extension(media_store): Extension<Arc<dyn MediaStore>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let plant = find_owned_plant(plant_store.as_ref(), &user, &id, "delete").await?;

    plant_store.delete(&plant.id).await?;
    discard_image(media_store.as_ref(), &plant.image_path).await;

    info!(plant_id = %plant.id, "Plant deleted");
    Ok(Json(MessageResponse::new("Plant deleted successfully")))
}

/// List the public feed
///
/// Every posted plant, with its owner and the owner's address. No authentication needed.
///
/// # Errors
///
/// Returns an error if:
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
#[instrument(skip_all)]
pub async fn list_all_plants(
    Extension(plant_store): Extension<Arc<dyn PlantStore>>,
    Extension(user_store): Extension<Arc<dyn UserStore>>,
    Extension(storage_url): Extension<PublicStorageUrl>,
) -> Result<Json<Vec<PlantResponse>>, AppError> {
    let plants = plant_store
        .list_posted()
        .await
        .inspect_err(|err| error!("Failed to list posted plants: {err}"))?;

    let owner_ids: Vec<String> = plants
        .iter()
        .map(|plant| plant.owner_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let owners = user_store
        .get_many(&owner_ids)
        .await
        .inspect_err(|err| error!("Failed to load plant owners: {err}"))?;

    Ok(Json(
        plants
            .into_iter()
            .map(|plant| {
                let owner = owners.get(&plant.owner_id).cloned();
                if owner.is_none() {
                    warn!(plant_id = %plant.id, owner_id = %plant.owner_id, "Plant owner not found");
                }
                PlantResponse {
                    owner,
                    ..PlantResponse::new(plant, &storage_url)
                }
            })
            .collect(),
    ))
}

/// Resolves a plant by ID and checks that the caller owns it
async fn find_owned_plant(
    plant_store: &dyn PlantStore,
    user: &AuthenticatedUser,
    id: &str,
    action: &str,
) -> Result<Plant, AppError> {
    let plant = plant_store
        .get_one(id)
        .await?
        .ok_or_else(|| AppError::not_found("Plant not found"))?;

    if plant.owner_id != user.user_id {
        warn!(plant_id = %id, owner_id = %plant.owner_id, "Caller does not own plant");
        return Err(AppError::forbidden(format!(
            "You are not allowed to {action} this plant."
        )));
    }

    Ok(plant)
}

async fn set_posted(
    plant_store: &dyn PlantStore,
    user: &AuthenticatedUser,
    id: &str,
    posted: bool,
) -> Result<Plant, AppError> {
    let action = if posted { "post" } else { "remove" };
    find_owned_plant(plant_store, user, id, action).await?;

    let plant = plant_store.set_posted(id, posted).await?;
    info!(plant_id = %plant.id, posted, "Plant feed visibility changed");

    Ok(plant)
}

/// Best-effort image removal; missing objects and failures are only logged
async fn discard_image(media_store: &dyn MediaStore, image_path: &str) {
    match media_store.exists(image_path).await {
        Ok(true) => {
            if let Err(err) = media_store.delete(image_path).await {
                error!(image_path, "Failed to delete plant image: {err}");
            }
        }
        Ok(false) => debug!(image_path, "Plant image already absent"),
        Err(err) => error!(image_path, "Failed to check plant image: {err}"),
    }
}
