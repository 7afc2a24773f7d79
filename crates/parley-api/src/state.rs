//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API. Services are generic over repository/hasher/issuer traits;
//! AppState pins them to the concrete infra implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;

use parley_core::auth::service::AuthService;
use parley_core::conversation::service::ConversationService;
use parley_core::directory::UserDirectory;
use parley_infra::auth::jwt::JwtTokenIssuer;
use parley_infra::config::{access_token_ttl, resolve_database_url, resolve_jwt_secret};
use parley_infra::crypto::password::Argon2PasswordHasher;
use parley_infra::sqlite::conversation::SqliteConversationRepository;
use parley_infra::sqlite::message::SqliteMessageRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::token::SqliteRevokedTokenRepository;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService = AuthService<
    SqliteUserRepository,
    SqliteRevokedTokenRepository,
    Argon2PasswordHasher,
    JwtTokenIssuer,
>;

pub type ConcreteConversationService = ConversationService<
    SqliteUserRepository,
    SqliteConversationRepository,
    SqliteMessageRepository,
>;

pub type ConcreteUserDirectory = UserDirectory<SqliteUserRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub conversation_service: Arc<ConcreteConversationService>,
    pub user_directory: Arc<ConcreteUserDirectory>,
    pub db_pool: DatabasePool,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init(config: AppConfig, data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let db_url = resolve_database_url(&config, data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;
        let secret = resolve_jwt_secret(&config);

        tracing::info!(data_dir = %data_dir.display(), "application state initialized");
        Ok(Self::from_pool(db_pool, config, &secret, data_dir))
    }

    /// Wire services over an already opened pool.
    pub fn from_pool(
        db_pool: DatabasePool,
        config: AppConfig,
        secret: &SecretString,
        data_dir: &Path,
    ) -> Self {
        let per_page = config.pagination.per_page;

        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteRevokedTokenRepository::new(db_pool.clone()),
            Argon2PasswordHasher::new(),
            JwtTokenIssuer::new(secret, access_token_ttl(&config)),
        );

        let conversation_service = ConversationService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteConversationRepository::new(db_pool.clone()),
            SqliteMessageRepository::new(db_pool.clone()),
            per_page,
        );

        let user_directory = UserDirectory::new(SqliteUserRepository::new(db_pool.clone()), per_page);

        Self {
            auth_service: Arc::new(auth_service),
            conversation_service: Arc::new(conversation_service),
            user_directory: Arc::new(user_directory),
            db_pool,
            config: Arc::new(config),
            data_dir: data_dir.to_path_buf(),
        }
    }
}
