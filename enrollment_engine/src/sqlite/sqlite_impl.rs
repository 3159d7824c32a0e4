//! `SqliteDatabase` is a concrete implementation of an enrollment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{catalog, enrollments, new_pool, orders};
use crate::{
    db_types::{
        CatalogItem,
        Enrollment,
        GatewayOrderId,
        NewEnrollment,
        NewOrder,
        Order,
        PaymentDetails,
        PurchasedItem,
        UserProfile,
    },
    traits::{
        CatalogError,
        CatalogLookup,
        EnrollOutcome,
        EnrollmentManagement,
        ExpiryResult,
        MarkPaidResult,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SettlementRecord,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} [{}] has been saved for {}", order.id, order.gateway_order_id, order.user_id);
        Ok(order)
    }

    async fn mark_order_paid(&self, id: i64, payment: &PaymentDetails) -> Result<MarkPaidResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::mark_paid(id, payment, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn settle_order(&self, id: i64, payment: &PaymentDetails) -> Result<SettlementRecord, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let MarkPaidResult { order, newly_paid } = orders::mark_paid(id, payment, &mut tx).await?;
        let enrollment = enrollments::insert_if_absent(NewEnrollment::from(&order), &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{id} settled. Newly paid: {newly_paid}. New enrollment: {}",
            enrollment.is_new()
        );
        Ok(SettlementRecord { order, newly_paid, enrollment })
    }

    async fn expire_stale_orders(&self, older_than: Duration) -> Result<ExpiryResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let expired = orders::expire_orders(older_than, &mut tx).await?;
        tx.commit().await?;
        if !expired.is_empty() {
            debug!("🗃️ {} orders have been expired", expired.len());
        }
        Ok(ExpiryResult::new(expired))
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_gateway_id(&self, id: &GatewayOrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_gateway_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }
}

impl EnrollmentManagement for SqliteDatabase {
    async fn fetch_enrollment(
        &self,
        user_id: &str,
        item: &PurchasedItem,
    ) -> Result<Option<Enrollment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let enrollment = enrollments::fetch_enrollment(user_id, item, &mut conn).await?;
        Ok(enrollment)
    }

    async fn fetch_enrollments_for_user(&self, user_id: &str) -> Result<Vec<Enrollment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = enrollments::fetch_enrollments_for_user(user_id, &mut conn).await?;
        Ok(result)
    }

    async fn enroll(&self, enrollment: NewEnrollment) -> Result<EnrollOutcome, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let outcome = enrollments::insert_if_absent(enrollment, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}

impl CatalogLookup for SqliteDatabase {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let user = catalog::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_catalog_item(&self, item: &PurchasedItem) -> Result<Option<CatalogItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let item = catalog::fetch_catalog_item(item, &mut conn).await?;
        Ok(item)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
