use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use backend::{
    jwt::JwtManager,
    media_storage::{LocalMediaStorage, MediaStore, PublicStorageUrl},
    server::{build_router, AppDependencies},
    types::Environment,
};
use plant_storage::{
    plant::{mock::InMemoryPlantStorage, PlantStore},
    user::{mock::InMemoryUserStorage, User},
};
use tempfile::TempDir;
use tower::ServiceExt;

use super::utils::MultipartForm;

pub const TEST_JWT_SECRET: &str = "plants-test-secret";
pub const TEST_BASE_URL: &str = "http://localhost:8000";

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory stores and a temporary public disk
pub struct TestSetup {
    pub router: Router,
    pub plant_store: Arc<dyn PlantStore>,
    pub user_store: Arc<InMemoryUserStorage>,
    pub media_store: Arc<LocalMediaStorage>,
    pub jwt_manager: Arc<JwtManager>,
    // Keep the storage directory alive for the duration of the test
    storage_dir: TempDir,
}

impl TestSetup {
    pub async fn new() -> Self {
        Self::with_plant_store(Arc::new(InMemoryPlantStorage::new())).await
    }

    pub async fn with_plant_store(plant_store: Arc<dyn PlantStore>) -> Self {
        setup_test_env();

        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
        let media_store = Arc::new(
            LocalMediaStorage::new(storage_dir.path().to_path_buf())
                .await
                .expect("Failed to create local media storage"),
        );
        let user_store = Arc::new(InMemoryUserStorage::new());
        let jwt_manager = Arc::new(JwtManager::new(TEST_JWT_SECRET));

        let router = build_router(
            Environment::Development {
                disable_auth: false,
            },
            AppDependencies {
                plant_store: plant_store.clone(),
                user_store: user_store.clone(),
                media_store: media_store.clone() as Arc<dyn MediaStore>,
                jwt_manager: jwt_manager.clone(),
                storage_url: PublicStorageUrl::new(TEST_BASE_URL),
                local_storage_root: Some(storage_dir.path().to_path_buf()),
            },
        );

        Self {
            router,
            plant_store,
            user_store,
            media_store,
            jwt_manager,
            storage_dir,
        }
    }

    /// Issues a valid access token for `user_id`
    pub fn token_for(&self, user_id: &str) -> String {
        self.jwt_manager
            .issue_token(user_id)
            .expect("Failed to issue token")
    }

    pub fn add_user(&self, user: User) {
        self.user_store.insert(user);
    }

    pub fn storage_root(&self) -> &Path {
        self.storage_dir.path()
    }

    /// Files currently stored under `plants/`
    pub fn stored_plant_images(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.storage_root().join("plants"))
            .map(|entries| entries.filter_map(|entry| entry.ok().map(|e| e.path())).collect())
            .unwrap_or_default()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn send_request(&self, method: Method, route: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(route).method(method);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        self.send(builder.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    pub async fn send_create_plant(&self, form: MultipartForm, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri("/api/plants/create-plant")
            .method(Method::POST)
            .header(header::CONTENT_TYPE, MultipartForm::content_type());
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        self.send(
            builder
                .body(Body::from(form.finish()))
                .expect("Failed to build request"),
        )
        .await
    }

    /// Creates a plant through the API and returns its JSON body
    pub async fn create_plant_as(&self, user_id: &str, name: &str) -> serde_json::Value {
        let token = self.token_for(user_id);
        let response = self
            .send_create_plant(super::utils::valid_plant_form(name), Some(&token))
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);

        super::utils::parse_response_body(response).await
    }
}
