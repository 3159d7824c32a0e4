use thiserror::Error;

use crate::db_types::{CatalogItem, PurchasedItem, UserProfile};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog lookup failed: {0}")]
    LookupFailed(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::LookupFailed(e.to_string())
    }
}

/// Read-only access to the user and course catalog. The engine never writes to these records.
#[allow(async_fn_in_trait)]
pub trait CatalogLookup {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>, CatalogError>;

    /// Fetches the title and price of a course or project. Order prices are always taken from here, never from the
    /// client.
    async fn fetch_catalog_item(&self, item: &PurchasedItem) -> Result<Option<CatalogItem>, CatalogError>;
}
