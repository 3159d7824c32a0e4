use lp_common::MinorUnits;
use sqlx::{FromRow, SqliteConnection};

use crate::db_types::{CatalogItem, PurchasedItem, UserProfile};

#[derive(Debug, Clone, FromRow)]
struct CatalogRow {
    title: String,
    price: i64,
    currency: String,
}

pub async fn fetch_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, sqlx::Error> {
    let user =
        sqlx::query_as("SELECT id, name, email FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_catalog_item(
    item: &PurchasedItem,
    conn: &mut SqliteConnection,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let q = match item {
        PurchasedItem::Course(_) => "SELECT title, price, currency FROM courses WHERE id = $1",
        PurchasedItem::Project(_) => "SELECT title, price, currency FROM projects WHERE id = $1",
    };
    let row: Option<CatalogRow> = sqlx::query_as(q).bind(item.id()).fetch_optional(conn).await?;
    Ok(row.map(|r| CatalogItem {
        item: item.clone(),
        title: r.title,
        price: MinorUnits::from(r.price),
        currency: r.currency,
    }))
}
