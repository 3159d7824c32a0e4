use std::path::Path;

use log::*;
use lp_common::MinorUnits;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::PurchasedItem, SqliteDatabase};

/// Creates a fresh database at `url` with the current schema, and initialises logging.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await
}

/// A database URL in the system temp directory that no other test is using.
pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("lps_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn run_migrations(url: &str) -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url(url, 10).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().expect("Database path is not valid UTF-8");
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Adds a user to the catalog mirror.
pub async fn seed_user(db: &SqliteDatabase, id: &str, name: &str, email: &str) {
    sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(db.pool())
        .await
        .expect("Error seeding user");
}

/// Adds a course or project to the catalog mirror.
pub async fn seed_item(db: &SqliteDatabase, item: &PurchasedItem, title: &str, price: MinorUnits, currency: &str) {
    let q = match item {
        PurchasedItem::Course(_) => "INSERT INTO courses (id, title, price, currency) VALUES ($1, $2, $3, $4)",
        PurchasedItem::Project(_) => "INSERT INTO projects (id, title, price, currency) VALUES ($1, $2, $3, $4)",
    };
    sqlx::query(q)
        .bind(item.id())
        .bind(title)
        .bind(price.value())
        .bind(currency)
        .execute(db.pool())
        .await
        .expect("Error seeding catalog item");
}

/// Moves an order's `updated_at` into the past, so that it looks stale to the expiry sweep.
pub async fn backdate_order(db: &SqliteDatabase, order_id: i64, hours: i64) {
    sqlx::query("UPDATE orders SET updated_at = datetime('now', $1) WHERE id = $2")
        .bind(format!("-{hours} hours"))
        .bind(order_id)
        .execute(db.pool())
        .await
        .expect("Error backdating order");
}

/// Counts the enrollments a user holds for an item. The schema guarantees this is 0 or 1.
pub async fn count_enrollments(db: &SqliteDatabase, user_id: &str, item: &PurchasedItem) -> i64 {
    let q = match item {
        PurchasedItem::Course(_) => "SELECT COUNT(*) FROM enrollments WHERE user_id = $1 AND course_id = $2",
        PurchasedItem::Project(_) => "SELECT COUNT(*) FROM enrollments WHERE user_id = $1 AND project_id = $2",
    };
    sqlx::query_scalar(q).bind(user_id).bind(item.id()).fetch_one(db.pool()).await.expect("Error counting enrollments")
}

pub async fn count_orders(db: &SqliteDatabase) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(db.pool()).await.expect("Error counting orders")
}
