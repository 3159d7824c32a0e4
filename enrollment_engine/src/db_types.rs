use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use lp_common::MinorUnits;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use thiserror::Error;

use crate::helpers::is_mock_order;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

fn decode_error<E: std::error::Error + Send + Sync + 'static>(column: &str, e: E) -> sqlx::Error {
    sqlx::Error::ColumnDecode { index: column.to_string(), source: Box::new(e) }
}

//--------------------------------------   GatewayOrderId   ---------------------------------------------------------
/// The order reference issued by the payment gateway (or synthesised in mock mode).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayOrderId(String);

impl GatewayOrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_mock(&self) -> bool {
        is_mock_order(&self.0)
    }
}

impl Display for GatewayOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GatewayOrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GatewayOrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------     ItemType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Course,
    Project,
}

impl Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Course => write!(f, "course"),
            ItemType::Project => write!(f, "project"),
        }
    }
}

impl FromStr for ItemType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "course" => Ok(Self::Course),
            "project" => Ok(Self::Project),
            _ => Err(ConversionError(format!("Invalid item type: {s}"))),
        }
    }
}

//--------------------------------------   PurchasedItem    ---------------------------------------------------------
/// The thing being bought. An order (and an enrollment) always refers to exactly one course or one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "itemType", content = "itemId", rename_all = "lowercase")]
pub enum PurchasedItem {
    Course(String),
    Project(String),
}

impl PurchasedItem {
    pub fn new<S: Into<String>>(item_type: ItemType, id: S) -> Self {
        match item_type {
            ItemType::Course => Self::Course(id.into()),
            ItemType::Project => Self::Project(id.into()),
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Course(_) => ItemType::Course,
            Self::Project(_) => ItemType::Project,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Course(id) | Self::Project(id) => id.as_str(),
        }
    }

    pub fn course_id(&self) -> Option<&str> {
        match self {
            Self::Course(id) => Some(id.as_str()),
            Self::Project(_) => None,
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::Project(id) => Some(id.as_str()),
            Self::Course(_) => None,
        }
    }
}

impl Display for PurchasedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.item_type(), self.id())
    }
}

//--------------------------------------  OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been opened with the gateway and is waiting for payment.
    Created,
    /// A verified payment settled the order. This state is final.
    Paid,
    /// The order sat unpaid for longer than the configured timeout. A verified payment can still settle it.
    Expired,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "Created"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Paid" => Ok(Self::Paid),
            "Expired" => Ok(Self::Expired),
            _ => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    #[serde(flatten)]
    pub item: PurchasedItem,
    pub gateway_order_id: GatewayOrderId,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: OrderStatusType,
    pub is_mock: bool,
    /// The gateway payment id that settled the order. Written once.
    pub payment_id: Option<String>,
    /// The raw evidence that settled the order, kept for audit.
    pub payment_details: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatusType::Paid
    }
}

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let item_type = row.try_get::<String, _>("item_type")?;
        let item_type = ItemType::from_str(&item_type).map_err(|e| decode_error("item_type", e))?;
        let item = PurchasedItem::new(item_type, row.try_get::<String, _>("item_id")?);
        let status = row.try_get::<String, _>("status")?;
        let status = OrderStatusType::from_str(&status).map_err(|e| decode_error("status", e))?;
        let payment_details = row
            .try_get::<Option<String>, _>("payment_details")?
            .map(|s| serde_json::from_str::<Value>(&s))
            .transpose()
            .map_err(|e| decode_error("payment_details", e))?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            item,
            gateway_order_id: GatewayOrderId(row.try_get("gateway_order_id")?),
            amount: MinorUnits::from(row.try_get::<i64, _>("amount")?),
            currency: row.try_get("currency")?,
            status,
            is_mock: row.try_get("is_mock")?,
            payment_id: row.try_get("payment_id")?,
            payment_details,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------      NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The user placing the order
    pub user_id: String,
    /// The course or project being bought
    pub item: PurchasedItem,
    /// The order reference returned by the gateway (or the mock gateway)
    pub gateway_order_id: GatewayOrderId,
    /// The price in minor units, taken from the catalog
    pub amount: MinorUnits,
    pub currency: String,
    pub is_mock: bool,
}

impl NewOrder {
    pub fn new<S: Into<String>>(
        user_id: S,
        item: PurchasedItem,
        gateway_order_id: GatewayOrderId,
        amount: MinorUnits,
        currency: S,
    ) -> Self {
        let is_mock = gateway_order_id.is_mock();
        Self { user_id: user_id.into(), item, gateway_order_id, amount, currency: currency.into(), is_mock }
    }
}

//--------------------------------------   PaymentDetails   ---------------------------------------------------------
/// Which path supplied the evidence that settled an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    Checkout,
    Webhook,
    Mock,
}

impl Display for PaymentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentSource::Checkout => write!(f, "checkout"),
            PaymentSource::Webhook => write!(f, "webhook"),
            PaymentSource::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_id: String,
    pub source: PaymentSource,
    pub raw: Value,
}

impl PaymentDetails {
    pub fn new<S: Into<String>>(payment_id: S, source: PaymentSource, raw: Value) -> Self {
        Self { payment_id: payment_id.into(), source, raw }
    }

    /// The JSON blob stored against the order.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "source": self.source, "payment_id": self.payment_id, "raw": self.raw }).to_string()
    }
}

//--------------------------------------     Enrollment     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub user_id: String,
    #[serde(flatten)]
    pub item: PurchasedItem,
    /// The order whose settlement created this enrollment, if any
    pub order_id: Option<i64>,
    pub enrollment_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
}

impl FromRow<'_, SqliteRow> for Enrollment {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let course_id = row.try_get::<Option<String>, _>("course_id")?;
        let project_id = row.try_get::<Option<String>, _>("project_id")?;
        let item = match (course_id, project_id) {
            (Some(id), None) => PurchasedItem::Course(id),
            (None, Some(id)) => PurchasedItem::Project(id),
            _ => {
                let e = ConversionError("An enrollment must refer to exactly one course or project".into());
                return Err(decode_error("course_id", e));
            },
        };
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            item,
            order_id: row.try_get("order_id")?,
            enrollment_date: row.try_get("enrollment_date")?,
            completion_date: row.try_get("completion_date")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
    pub user_id: String,
    pub item: PurchasedItem,
    pub order_id: Option<i64>,
}

impl NewEnrollment {
    pub fn new<S: Into<String>>(user_id: S, item: PurchasedItem) -> Self {
        Self { user_id: user_id.into(), item, order_id: None }
    }
}

impl From<&Order> for NewEnrollment {
    fn from(order: &Order) -> Self {
        Self { user_id: order.user_id.clone(), item: order.item.clone(), order_id: Some(order.id) }
    }
}

//--------------------------------------   Catalog records  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub item: PurchasedItem,
    pub title: String,
    pub price: MinorUnits,
    pub currency: String,
}
