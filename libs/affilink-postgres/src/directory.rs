//! Directory lookups backed by the identity tables

use affilink_domain::ports::{CompanyProfile, Directory, MarketerProfile};
use affilink_domain::{CategoryId, CompanyId, MarketerId, MarketplaceError};
use sqlx::postgres::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::map_db_error;

/// Read-only view over the `companies`, `categories` and `marketers` tables
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Directory for PgDirectory {
    #[instrument(skip(self), fields(company_id = %id), level = "debug")]
    async fn company(&self, id: CompanyId) -> Result<Option<CompanyProfile>, MarketplaceError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, bool)>(
            "SELECT id, user_id, is_verified FROM companies WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error("load company"))?;

        Ok(row.map(|(id, user_id, is_verified)| CompanyProfile {
            id: id.into(),
            user_id: user_id.into(),
            is_verified,
        }))
    }

    async fn category_exists(&self, id: CategoryId) -> Result<bool, MarketplaceError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(Uuid::from(id))
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error("check category"))
    }

    #[instrument(skip(self), fields(marketer_id = %id), level = "debug")]
    async fn marketer(&self, id: MarketerId) -> Result<Option<MarketerProfile>, MarketplaceError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid)>("SELECT id, user_id FROM marketers WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("load marketer"))?;

        Ok(row.map(|(id, user_id)| MarketerProfile {
            id: id.into(),
            user_id: user_id.into(),
        }))
    }
}
