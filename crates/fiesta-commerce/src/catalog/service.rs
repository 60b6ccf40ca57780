//! Catalog reads and administrator product management.

use std::sync::Arc;

use crate::catalog::{Product, ProductDraft};
use crate::ids::ProductId;
use crate::ports::{require_admin, CatalogQuery, IdentityProvider, ProductAdmin};
use crate::CommerceError;

/// Product listing for shoppers and product CRUD for administrators.
pub struct CatalogService {
    query: Arc<dyn CatalogQuery>,
    admin: Arc<dyn ProductAdmin>,
    identity: Arc<dyn IdentityProvider>,
}

impl CatalogService {
    pub fn new(
        query: Arc<dyn CatalogQuery>,
        admin: Arc<dyn ProductAdmin>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            query,
            admin,
            identity,
        }
    }

    /// All products, ordered by name.
    #[tracing::instrument(skip_all)]
    pub async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        let mut products = self.query.list_products().await?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(count = products.len(), "listed products");
        Ok(products)
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CommerceError> {
        self.query
            .get_product(id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))
    }

    #[tracing::instrument(skip_all, fields(name = %draft.name))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, CommerceError> {
        draft.validate()?;
        let user = require_admin(self.identity.as_ref()).await?;
        let product = self.admin.create_product(draft).await?;
        tracing::info!(product = %product.id, admin = %user, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip_all, fields(product = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, CommerceError> {
        draft.validate()?;
        let user = require_admin(self.identity.as_ref()).await?;
        let product = self.admin.update_product(id, draft).await?;
        tracing::info!(admin = %user, "product updated");
        Ok(product)
    }

    #[tracing::instrument(skip_all, fields(product = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), CommerceError> {
        let user = require_admin(self.identity.as_ref()).await?;
        self.admin.delete_product(id).await?;
        tracing::info!(admin = %user, "product deleted");
        Ok(())
    }
}
