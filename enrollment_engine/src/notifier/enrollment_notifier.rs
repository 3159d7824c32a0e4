use log::*;
use thiserror::Error;

use crate::{
    db_types::{CatalogItem, PurchasedItem, UserProfile},
    notifier::{MailError, MailSender},
    traits::{CatalogError, CatalogLookup},
};

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("User {0} does not exist")]
    UserNotFound(String),
    #[error("Catalog item {0} does not exist")]
    ItemNotFound(PurchasedItem),
    #[error("{0}")]
    Lookup(#[from] CatalogError),
    #[error("{0}")]
    Mail(#[from] MailError),
}

/// Sends the "you're enrolled" email.
#[derive(Debug, Clone)]
pub struct EnrollmentNotifier<C, M> {
    catalog: C,
    mailer: M,
}

impl<C, M> EnrollmentNotifier<C, M>
where
    C: CatalogLookup,
    M: MailSender,
{
    pub fn new(catalog: C, mailer: M) -> Self {
        Self { catalog, mailer }
    }

    /// Tells the user about their new enrollment. Failures are logged and swallowed; the enrollment itself has
    /// already been committed.
    pub async fn notify_enrollment(&self, user_id: &str, item: &PurchasedItem) {
        match self.try_notify(user_id, item).await {
            Ok(()) => info!("✉️ Enrollment confirmation for {item} sent to {user_id}"),
            Err(e) => warn!("✉️ Could not send the enrollment confirmation for {item} to {user_id}. {e}"),
        }
    }

    pub async fn try_notify(&self, user_id: &str, item: &PurchasedItem) -> Result<(), NotifierError> {
        let user = self.catalog.fetch_user(user_id).await?.ok_or_else(|| NotifierError::UserNotFound(user_id.into()))?;
        let details =
            self.catalog.fetch_catalog_item(item).await?.ok_or_else(|| NotifierError::ItemNotFound(item.clone()))?;
        let (subject, body) = render_confirmation(&user, &details);
        self.mailer.send(&user.email, &subject, &body).await?;
        Ok(())
    }
}

fn render_confirmation(user: &UserProfile, item: &CatalogItem) -> (String, String) {
    let kind = item.item.item_type();
    let subject = format!("You're enrolled: {}", item.title);
    let body = format!(
        "Hi {name},\n\nThank you for your purchase. Your payment of {price} {currency} has been received and you now \
         have full access to the {kind} \"{title}\".\n\nHappy learning!\n",
        name = user.name,
        price = item.price,
        currency = item.currency,
        title = item.title,
    );
    (subject, body)
}
