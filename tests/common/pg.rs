use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use rolegate::db::PgUserStore;

/// A throwaway database with migrations applied.
pub struct TestDb {
    pub store: PgUserStore,
    pub pool: PgPool,
    db_name: String,
    admin_url: String,
}

fn with_db_name(url: &str, db_name: &str) -> String {
    url.rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| url.to_string())
}

/// Create a fresh database, or `None` when `DATABASE_URL` is unset.
pub async fn test_db() -> Option<TestDb> {
    let _ = dotenvy::dotenv();
    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let db_name = format!("rolegate_test_{}", Uuid::now_v7().simple());
    let admin_url = with_db_name(&base_url, "postgres");

    let admin_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");
    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");
    admin_pool.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&with_db_name(&base_url, &db_name))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    Some(TestDb {
        store: PgUserStore::new(pool.clone()),
        pool,
        db_name,
        admin_url,
    })
}

impl TestDb {
    /// Drop the database. Call at the end of every test.
    pub async fn cleanup(self) {
        let TestDb {
            store,
            pool,
            db_name,
            admin_url,
        } = self;
        drop(store);
        pool.close().await;

        let admin_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&admin_url)
            .await
            .expect("Failed to connect for cleanup");
        let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
            .execute(&admin_pool)
            .await;
        admin_pool.close().await;
    }
}
