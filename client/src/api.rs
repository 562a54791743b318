use std::time::Duration;

use async_trait::async_trait;
use plant_storage::{plant::Plant, user::User};
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::{ClientError, ClientResult, ErrorEnvelope};

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Plant as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlantView {
    #[serde(flatten)]
    pub plant: Plant,
    /// Public URL of the plant image
    pub image_url: String,
    /// Owner with address, only set in the public feed
    #[serde(default)]
    pub owner: Option<User>,
}

/// Image attached to a new plant
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Plant upload form
#[derive(Debug, Clone)]
pub struct NewPlant {
    pub name: String,
    pub description: String,
    pub care_advice: String,
    pub image: ImageFile,
}

/// Operations of the Plant API
#[async_trait]
pub trait PlantsApi: Send + Sync {
    /// Uploads a new plant owned by the caller
    async fn create_plant(&self, plant: NewPlant) -> ClientResult<PlantView>;

    /// Lists the caller's plants
    async fn list_mine(&self) -> ClientResult<Vec<PlantView>>;

    /// Posts a plant to the public feed, returning the confirmation message
    async fn post_plant(&self, id: &str) -> ClientResult<String>;

    /// Withdraws a plant from the public feed, returning the confirmation message
    async fn remove_plant(&self, id: &str) -> ClientResult<String>;

    /// Deletes a plant and its image, returning the confirmation message
    async fn delete_plant(&self, id: &str) -> ClientResult<String>;

    /// Lists the public feed
    async fn list_all(&self) -> ClientResult<Vec<PlantView>>;
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

/// HTTP client for the Plant API
pub struct PlantsApiClient {
    base_url: String,
    token: Option<String>,
    http_client: Client,
}

impl PlantsApiClient {
    /// Creates a client for the API served at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http_client,
        })
    }

    /// Sends `token` as bearer credentials on every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/plants/{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.authorized(request).send().await?;
        decode(response).await
    }

    async fn send_message(&self, request: RequestBuilder) -> ClientResult<String> {
        self.send::<MessageResponse>(request)
            .await
            .map(|response| response.message)
    }
}

/// Decodes a success body, or turns the error envelope into [`ClientError::Api`]
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let (code, message, fields) = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => (
            envelope.error.code,
            envelope.error.message,
            envelope.error.fields,
        ),
        Err(_) => (
            "unknown".to_string(),
            status.canonical_reason().unwrap_or("Unknown error").to_string(),
            Default::default(),
        ),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
        fields,
    })
}

#[async_trait]
impl PlantsApi for PlantsApiClient {
    async fn create_plant(&self, plant: NewPlant) -> ClientResult<PlantView> {
        let image = Part::bytes(plant.image.bytes)
            .file_name(plant.image.file_name)
            .mime_str(&plant.image.content_type)?;

        let form = Form::new()
            .text("name", plant.name)
            .text("description", plant.description)
            .text("conseil_entretien", plant.care_advice)
            .part("image", image);

        self.send(self.http_client.post(self.url("create-plant")).multipart(form))
            .await
    }

    async fn list_mine(&self) -> ClientResult<Vec<PlantView>> {
        self.send(self.http_client.get(self.url("get-user-plants")))
            .await
    }

    async fn post_plant(&self, id: &str) -> ClientResult<String> {
        self.send_message(self.http_client.patch(self.url(&format!("post-plant/{id}"))))
            .await
    }

    async fn remove_plant(&self, id: &str) -> ClientResult<String> {
        self.send_message(
            self.http_client
                .patch(self.url(&format!("remove-plant/{id}"))),
        )
        .await
    }

    async fn delete_plant(&self, id: &str) -> ClientResult<String> {
        self.send_message(
            self.http_client
                .delete(self.url(&format!("delete-plant/{id}"))),
        )
        .await
    }

    async fn list_all(&self) -> ClientResult<Vec<PlantView>> {
        self.send(self.http_client.get(self.url("all-plants"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_rooted_at_plants_api() {
        let client = PlantsApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(
            client.url("post-plant/p1"),
            "http://localhost:8000/api/plants/post-plant/p1"
        );
    }

    #[test]
    fn test_plant_view_reads_flattened_plant() {
        let view: PlantView = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "owner_id": "alice",
            "name": "Basil",
            "description": "Sweet basil",
            "care_advice": "Water often",
            "image_path": "plants/a.png",
            "posted": true,
            "created_at": 1,
            "updated_at": 2,
            "image_url": "http://localhost:8000/storage/plants/a.png"
        }))
        .unwrap();

        assert_eq!(view.plant.name, "Basil");
        assert!(view.plant.posted);
        assert!(view.owner.is_none());
    }
}
