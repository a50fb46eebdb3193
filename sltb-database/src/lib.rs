pub mod database;
pub mod config;
pub mod models;
pub mod types;

use log::info;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

use crate::config::{mask_url, DatabaseConfig};
use crate::models::{planting_applications, reference_entries, replanting_applications, users};

/**
 * Initialize the environment (dotenv). The binary does this in main; tests call it directly.
 */
pub fn init() {
    dotenv::dotenv().ok();
}

/// Handle to the connection pool. Constructed once at startup and shared
/// behind `web::Data`; `close` needs the last handle.
#[derive(Debug)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /**
     * Open the connection pool and check that the database answers
     *
     * # Arguments
     * @param config: &DatabaseConfig - Pool settings
     *
     * # Returns
     * @return Result<Store, sea_orm::DbErr> - The store, or the connect/ping failure
     */
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        info!("Connecting to database: {}", mask_url(&config.url));

        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .sqlx_logging(config.sql_logging);

        let conn = Database::connect(options).await?;
        conn.ping().await?;
        info!(
            "Database pool ready ({} max connections)",
            config.max_connections
        );
        Ok(Store { conn })
    }

    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Store { conn }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub async fn ping(&self) -> Result<(), DbErr> {
        self.conn.ping().await
    }

    /// Create any missing table. Users come first since applications reference them.
    pub async fn sync_schema(&self) -> Result<(), DbErr> {
        self.create_table(users::Entity).await?;
        self.create_table(planting_applications::Entity).await?;
        self.create_table(replanting_applications::Entity).await?;
        self.create_table(reference_entries::Entity).await?;
        Ok(())
    }

    async fn create_table<E: EntityTrait>(&self, entity: E) -> Result<(), DbErr> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);
        let mut statement = schema.create_table_from_entity(entity);
        statement.if_not_exists();
        self.conn.execute(backend.build(&statement)).await?;
        Ok(())
    }

    pub async fn close(self) -> Result<(), DbErr> {
        info!("Closing database pool");
        self.conn.close().await
    }
}

#[cfg(all(test, feature = "online-tests"))]
mod tests {
    use rust_decimal::Decimal;
    use serial_test::serial;

    use super::*;
    use crate::database::{applications, references, users as user_queries};
    use crate::models::applications::{ApplicationPatch, NewApplication};
    use crate::types::{ApplicationKind, ApplicationStatus, UserRole, UserStatus};

    async fn setup_test_environment() -> Store {
        init();
        let config = DatabaseConfig::from_env().expect("database settings");
        let store = Store::connect(&config).await.expect("database connection");
        store.sync_schema().await.expect("schema");
        store
    }

    fn unique_suffix() -> String {
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string()
    }

    async fn owner(store: &Store) -> i32 {
        user_queries::create_user(
            store.conn(),
            user_queries::NewUser {
                first_name: "Online".to_string(),
                last_name: "Tester".to_string(),
                email: format!("online-{}@example.com", unique_suffix()),
                phone_number: None,
                password: "not-a-real-hash".to_string(),
                role: UserRole::User,
                status: UserStatus::Active,
            },
        )
        .await
        .expect("user")
        .id
    }

    fn submission(file_no: String) -> NewApplication {
        NewApplication {
            file_no,
            owner_name: "Online Owner".to_string(),
            estate_name: "Online Estate".to_string(),
            ti_range: None,
            division: None,
            field_no: None,
            plan_no: None,
            subsidy_type: "New Planting".to_string(),
            approved_extent: Decimal::new(200, 2),
            x1_coordinate: None,
            x2_coordinate: None,
            plants_per_ha: 4400,
            approved_plants: 6600,
            amount_per_plant: Decimal::new(2550, 2),
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_establish_connection_with_env_url() {
        let store = setup_test_environment().await;
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn test_submission_is_resolvable_by_reference() {
        let store = setup_test_environment().await;
        let owner = owner(&store).await;
        let reference_no = format!("SLTB-PLANT-{}", unique_suffix());

        let record = applications::create_application(
            store.conn(),
            ApplicationKind::Planting,
            owner,
            &submission(format!("ONLINE/{}", unique_suffix())),
            &reference_no,
        )
        .await
        .expect("insert");
        assert_eq!(record.total_approved_amount, Decimal::new(16830000, 2));

        let entry = references::get_reference(store.conn(), &reference_no)
            .await
            .unwrap()
            .expect("reference entry");
        let resolved = applications::find_application(store.conn(), entry.application_type, entry.application_id)
            .await
            .unwrap()
            .expect("application");
        assert_eq!(resolved.reference_no, reference_no);
    }

    #[tokio::test]
    #[serial]
    async fn test_amount_only_update_keeps_plant_count() {
        let store = setup_test_environment().await;
        let owner = owner(&store).await;
        let record = applications::create_application(
            store.conn(),
            ApplicationKind::Replanting,
            owner,
            &submission(format!("ONLINE/{}", unique_suffix())),
            &format!("SLTB-REPLANT-{}", unique_suffix()),
        )
        .await
        .expect("insert");

        let patch = ApplicationPatch {
            amount_per_plant: Some(Decimal::new(3000, 2)),
            ..Default::default()
        };
        let written = applications::update_pending_application(
            store.conn(),
            ApplicationKind::Replanting,
            record.id,
            owner,
            &patch,
        )
        .await
        .unwrap();
        assert_eq!(written, 1);

        let updated = applications::find_application(store.conn(), ApplicationKind::Replanting, record.id)
            .await
            .unwrap()
            .expect("application");
        assert_eq!(updated.approved_plants, 6600);
        assert_eq!(updated.total_approved_amount, Decimal::new(19800000, 2));
    }

    #[tokio::test]
    #[serial]
    async fn test_non_pending_rows_are_immutable() {
        let store = setup_test_environment().await;
        let owner = owner(&store).await;
        let record = applications::create_application(
            store.conn(),
            ApplicationKind::Planting,
            owner,
            &submission(format!("ONLINE/{}", unique_suffix())),
            &format!("SLTB-PLANT-{}", unique_suffix()),
        )
        .await
        .expect("insert");

        let moved = applications::transition_application_status(
            store.conn(),
            ApplicationKind::Planting,
            record.id,
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            None,
        )
        .await
        .unwrap();
        assert_eq!(moved, 1);

        let deleted =
            applications::delete_pending_application(store.conn(), ApplicationKind::Planting, record.id, owner)
                .await
                .unwrap();
        assert_eq!(deleted, 0);
    }
}
