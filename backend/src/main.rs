use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use backend::{
    jwt::JwtManager,
    media_storage::{LocalMediaStorage, MediaStore, PublicStorageUrl, S3MediaStorage},
    server::{self, AppDependencies},
    types::{Environment, MediaDriver},
};
use plant_storage::{
    plant::{PlantStorage, PlantStore},
    user::{UserStorage, UserStore},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.tracing_level().as_str()));

    // JSON logs for staging/production, human readable logs for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(env_filter).init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(env_filter).init();
        }
    }

    let aws_config = environment.aws_config().await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&aws_config));

    let plant_store: Arc<dyn PlantStore> = Arc::new(PlantStorage::new(
        dynamodb_client.clone(),
        environment.plants_table_name(),
        environment.plants_owner_index_name(),
    ));
    let user_store: Arc<dyn UserStore> = Arc::new(UserStorage::new(
        dynamodb_client,
        environment.users_table_name(),
    ));

    let (media_store, local_storage_root) = match environment.media_driver() {
        MediaDriver::S3 => {
            let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
            let storage = S3MediaStorage::new(s3_client, environment.s3_bucket());
            (Arc::new(storage) as Arc<dyn MediaStore>, None)
        }
        MediaDriver::Local => {
            let storage = LocalMediaStorage::new(environment.local_storage_root()).await?;
            let root = storage.root().to_path_buf();
            (Arc::new(storage) as Arc<dyn MediaStore>, Some(root))
        }
    };

    let dependencies = AppDependencies {
        plant_store,
        user_store,
        media_store,
        jwt_manager: Arc::new(JwtManager::new(&environment.jwt_secret())),
        storage_url: PublicStorageUrl::new(environment.public_storage_base_url()),
        local_storage_root,
    };

    server::start(environment, dependencies).await
}
