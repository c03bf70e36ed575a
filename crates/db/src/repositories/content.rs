//! Public content repository.
//!
//! Pages and FAQ entries are served unauthenticated; only published rows
//! are visible.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryFilter, QueryOrder,
};

use crate::entities::{content_pages, faq_items};

/// Read-only repository for public pages and FAQs.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    db: DatabaseConnection,
}

impl ContentRepository {
    /// Creates a new content repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a published page by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn page_by_slug(&self, slug: &str) -> Result<Option<content_pages::Model>, DbErr> {
        content_pages::Entity::find()
            .filter(content_pages::Column::Slug.eq(slug))
            .filter(content_pages::Column::IsPublished.eq(true))
            .one(&self.db)
            .await
    }

    /// Lists published FAQ entries grouped by category, in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_faq(&self) -> Result<Vec<faq_items::Model>, DbErr> {
        faq_items::Entity::find()
            .filter(faq_items::Column::IsPublished.eq(true))
            .order_by(faq_items::Column::Category, Order::Asc)
            .order_by(faq_items::Column::SortOrder, Order::Asc)
            .all(&self.db)
            .await
    }
}
