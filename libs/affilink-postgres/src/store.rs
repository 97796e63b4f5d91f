//! PostgreSQL implementation of the storage ports
//!
//! A [`PgUnitOfWork`] wraps one database transaction. Single-row getters use
//! `SELECT .. FOR UPDATE`, so a row read inside a unit of work stays locked
//! until it commits or rolls back. Per-marketer serialisation of balance work
//! uses a transaction-scoped advisory lock keyed on the marketer id.

use affilink_domain::application::CampaignApplication;
use affilink_domain::balance::WithdrawalTotals;
use affilink_domain::campaign::Campaign;
use affilink_domain::payment::{Payment, PaymentStatus, PaymentType};
use affilink_domain::ports::{
    ApplicationRepository, CampaignRepository, MarketplaceStore, PaymentMethodRepository,
    PaymentRepository, TrackingLinkRepository, UnitOfWork, WithdrawalRepository,
};
use affilink_domain::tracking::{LinkDelta, PerformanceLog, TrackingLink};
use affilink_domain::withdrawal::{PaymentMethod, WithdrawalRequest, WithdrawalStatus};
use affilink_domain::{
    ApplicationId, CampaignId, CompanyId, MarketerId, MarketplaceError, PaymentId,
    PaymentMethodId, TrackingLinkId, UserId, WithdrawalId,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::error::{expect_one_row, map_db_error};
use crate::rows::{
    convert_all, ApplicationRow, CampaignRow, PaymentMethodRow, PaymentRow, PerformanceLogRow,
    TrackingLinkRow, WithdrawalRow, APPLICATION_COLUMNS, CAMPAIGN_COLUMNS, PAYMENT_COLUMNS,
    PAYMENT_METHOD_COLUMNS, PERFORMANCE_LOG_COLUMNS, TRACKING_LINK_COLUMNS, WITHDRAWAL_COLUMNS,
};

type StoreResult<T> = Result<T, MarketplaceError>;

fn in_flight_statuses() -> Vec<&'static str> {
    [
        WithdrawalStatus::Pending,
        WithdrawalStatus::Approved,
        WithdrawalStatus::Processing,
    ]
    .iter()
    .map(WithdrawalStatus::as_str)
    .collect()
}

/// Connection pool handing out transactional units of work
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    ///
    /// # Errors
    ///
    /// `MarketplaceError::StorageFailure` when the database cannot be reached
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_db_error("connect"))?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| {
                error!(error = %err, "Failed to run migrations");
                MarketplaceError::storage_failure(format!("migration failed: {err}"))
            })?;

        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MarketplaceStore for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> StoreResult<PgUnitOfWork> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("begin transaction"))?;
        Ok(PgUnitOfWork { tx })
    }
}

/// One database transaction; dropping it without `commit` rolls back
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn fetch_optional<R>(
        &mut self,
        sql: &str,
        key: Uuid,
        operation: &'static str,
    ) -> StoreResult<Option<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, R>(sql)
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error(operation))
    }

    async fn fetch_all<R>(
        &mut self,
        sql: &str,
        key: Uuid,
        operation: &'static str,
    ) -> StoreResult<Vec<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, R>(sql)
            .bind(key)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error(operation))
    }

    async fn exists(&mut self, sql: &str, key: Uuid, operation: &'static str) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(sql)
            .bind(key)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_error(operation))
    }
}

impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(map_db_error("commit transaction"))
    }
}

impl CampaignRepository for PgUnitOfWork {
    async fn campaign(&mut self, id: CampaignId) -> StoreResult<Option<Campaign>> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE");
        self.fetch_optional::<CampaignRow>(&sql, id.into(), "load campaign")
            .await?
            .map(Campaign::try_from)
            .transpose()
    }

    async fn campaigns_for_company(&mut self, company_id: CompanyId) -> StoreResult<Vec<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
             WHERE company_id = $1 AND deleted_at IS NULL ORDER BY created_at, id"
        );
        let rows = self
            .fetch_all::<CampaignRow>(&sql, company_id.into(), "list campaigns")
            .await?;
        convert_all(rows)
    }

    async fn insert_campaign(&mut self, campaign: &Campaign) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO campaigns ({CAMPAIGN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(campaign.id))
            .bind(Uuid::from(campaign.company_id))
            .bind(Uuid::from(campaign.category_id))
            .bind(&campaign.title)
            .bind(&campaign.description)
            .bind(&campaign.promotional_materials)
            .bind(campaign.commission_type.as_str())
            .bind(campaign.commission_value)
            .bind(campaign.budget)
            .bind(campaign.start_date)
            .bind(campaign.end_date)
            .bind(campaign.status.as_str())
            .bind(campaign.approved_by.map(Uuid::from))
            .bind(&campaign.review_note)
            .bind(campaign.created_at)
            .bind(campaign.updated_at)
            .bind(campaign.deleted_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("insert campaign"))?;
        Ok(())
    }

    async fn update_campaign(&mut self, campaign: &Campaign) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE campaigns SET category_id = $2, title = $3, description = $4, \
             promotional_materials = $5, commission_type = $6, commission_value = $7, \
             budget = $8, start_date = $9, end_date = $10, status = $11, approved_by = $12, \
             review_note = $13, updated_at = $14, deleted_at = $15 WHERE id = $1",
        )
        .bind(Uuid::from(campaign.id))
        .bind(Uuid::from(campaign.category_id))
        .bind(&campaign.title)
        .bind(&campaign.description)
        .bind(&campaign.promotional_materials)
        .bind(campaign.commission_type.as_str())
        .bind(campaign.commission_value)
        .bind(campaign.budget)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(campaign.status.as_str())
        .bind(campaign.approved_by.map(Uuid::from))
        .bind(&campaign.review_note)
        .bind(campaign.updated_at)
        .bind(campaign.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error("update campaign"))?;

        expect_one_row(result.rows_affected(), "Campaign", campaign.id)
    }

    async fn delete_campaign(&mut self, id: CampaignId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("delete campaign"))?;

        expect_one_row(result.rows_affected(), "Campaign", id)
    }

    async fn campaign_has_activity(&mut self, id: CampaignId) -> StoreResult<bool> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM campaign_applications WHERE campaign_id = $1) \
             OR EXISTS (SELECT 1 FROM tracking_links WHERE campaign_id = $1)",
            id.into(),
            "check campaign activity",
        )
        .await
    }
}

impl ApplicationRepository for PgUnitOfWork {
    async fn application(&mut self, id: ApplicationId) -> StoreResult<Option<CampaignApplication>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM campaign_applications WHERE id = $1 FOR UPDATE"
        );
        self.fetch_optional::<ApplicationRow>(&sql, id.into(), "load application")
            .await?
            .map(CampaignApplication::try_from)
            .transpose()
    }

    async fn application_for(
        &mut self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> StoreResult<Option<CampaignApplication>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM campaign_applications \
             WHERE campaign_id = $1 AND marketer_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(Uuid::from(campaign_id))
            .bind(Uuid::from(marketer_id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error("load application by pair"))?
            .map(CampaignApplication::try_from)
            .transpose()
    }

    async fn applications_for_campaign(
        &mut self,
        campaign_id: CampaignId,
    ) -> StoreResult<Vec<CampaignApplication>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM campaign_applications \
             WHERE campaign_id = $1 ORDER BY applied_at, id"
        );
        let rows = self
            .fetch_all::<ApplicationRow>(&sql, campaign_id.into(), "list campaign applications")
            .await?;
        convert_all(rows)
    }

    async fn applications_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> StoreResult<Vec<CampaignApplication>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM campaign_applications \
             WHERE marketer_id = $1 ORDER BY applied_at, id"
        );
        let rows = self
            .fetch_all::<ApplicationRow>(&sql, marketer_id.into(), "list marketer applications")
            .await?;
        convert_all(rows)
    }

    async fn insert_application(&mut self, application: &CampaignApplication) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO campaign_applications ({APPLICATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(application.id))
            .bind(Uuid::from(application.campaign_id))
            .bind(Uuid::from(application.marketer_id))
            .bind(application.status.as_str())
            .bind(application.ai_match_score)
            .bind(application.applied_at)
            .bind(application.responded_at)
            .bind(&application.response_note)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("insert application"))?;
        Ok(())
    }

    async fn update_application(&mut self, application: &CampaignApplication) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE campaign_applications SET status = $2, ai_match_score = $3, \
             responded_at = $4, response_note = $5 WHERE id = $1",
        )
        .bind(Uuid::from(application.id))
        .bind(application.status.as_str())
        .bind(application.ai_match_score)
        .bind(application.responded_at)
        .bind(&application.response_note)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error("update application"))?;

        expect_one_row(result.rows_affected(), "CampaignApplication", application.id)
    }
}

impl TrackingLinkRepository for PgUnitOfWork {
    async fn tracking_link(&mut self, id: TrackingLinkId) -> StoreResult<Option<TrackingLink>> {
        let sql =
            format!("SELECT {TRACKING_LINK_COLUMNS} FROM tracking_links WHERE id = $1 FOR UPDATE");
        Ok(self
            .fetch_optional::<TrackingLinkRow>(&sql, id.into(), "load tracking link")
            .await?
            .map(TrackingLink::from))
    }

    async fn tracking_link_for(
        &mut self,
        campaign_id: CampaignId,
        marketer_id: MarketerId,
    ) -> StoreResult<Option<TrackingLink>> {
        let sql = format!(
            "SELECT {TRACKING_LINK_COLUMNS} FROM tracking_links \
             WHERE campaign_id = $1 AND marketer_id = $2 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, TrackingLinkRow>(&sql)
            .bind(Uuid::from(campaign_id))
            .bind(Uuid::from(marketer_id))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error("load tracking link by pair"))?;
        Ok(row.map(TrackingLink::from))
    }

    async fn tracking_links_for_campaign(
        &mut self,
        campaign_id: CampaignId,
    ) -> StoreResult<Vec<TrackingLink>> {
        let sql = format!(
            "SELECT {TRACKING_LINK_COLUMNS} FROM tracking_links \
             WHERE campaign_id = $1 ORDER BY created_at, id"
        );
        let rows = self
            .fetch_all::<TrackingLinkRow>(&sql, campaign_id.into(), "list campaign links")
            .await?;
        Ok(rows.into_iter().map(TrackingLink::from).collect())
    }

    async fn tracking_links_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> StoreResult<Vec<TrackingLink>> {
        let sql = format!(
            "SELECT {TRACKING_LINK_COLUMNS} FROM tracking_links \
             WHERE marketer_id = $1 ORDER BY created_at, id"
        );
        let rows = self
            .fetch_all::<TrackingLinkRow>(&sql, marketer_id.into(), "list marketer links")
            .await?;
        Ok(rows.into_iter().map(TrackingLink::from).collect())
    }

    async fn insert_tracking_link(&mut self, link: &TrackingLink) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO tracking_links ({TRACKING_LINK_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(link.id))
            .bind(Uuid::from(link.campaign_id))
            .bind(Uuid::from(link.marketer_id))
            .bind(&link.token)
            .bind(link.clicks)
            .bind(link.conversions)
            .bind(link.earnings)
            .bind(link.is_active)
            .bind(link.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("insert tracking link"))?;
        Ok(())
    }

    async fn set_tracking_link_active(&mut self, id: TrackingLinkId, active: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE tracking_links SET is_active = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(active)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("update tracking link"))?;

        expect_one_row(result.rows_affected(), "TrackingLink", id)
    }

    #[instrument(skip(self), fields(tracking_link_id = %id), level = "debug")]
    async fn increment_link_counters(
        &mut self,
        id: TrackingLinkId,
        delta: LinkDelta,
    ) -> StoreResult<TrackingLink> {
        let sql = format!(
            "UPDATE tracking_links SET clicks = clicks + $2, conversions = conversions + $3, \
             earnings = earnings + $4 WHERE id = $1 RETURNING {TRACKING_LINK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TrackingLinkRow>(&sql)
            .bind(Uuid::from(id))
            .bind(delta.clicks)
            .bind(delta.conversions)
            .bind(delta.earnings)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error("increment link counters"))?
            .ok_or_else(|| MarketplaceError::not_found("TrackingLink", id))?;

        debug!("Link counters incremented");
        Ok(row.into())
    }

    async fn append_performance_log(&mut self, entry: &PerformanceLog) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO performance_logs ({PERFORMANCE_LOG_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(entry.id))
            .bind(Uuid::from(entry.tracking_link_id))
            .bind(entry.event_type.as_str())
            .bind(entry.amount_earned)
            .bind(entry.recorded_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("append performance log"))?;
        Ok(())
    }

    async fn performance_log(&mut self, link_id: TrackingLinkId) -> StoreResult<Vec<PerformanceLog>> {
        let sql = format!(
            "SELECT {PERFORMANCE_LOG_COLUMNS} FROM performance_logs \
             WHERE tracking_link_id = $1 ORDER BY recorded_at, id"
        );
        let rows = self
            .fetch_all::<PerformanceLogRow>(&sql, link_id.into(), "list performance log")
            .await?;
        convert_all(rows)
    }
}

impl PaymentRepository for PgUnitOfWork {
    async fn payment(&mut self, id: PaymentId) -> StoreResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
        self.fetch_optional::<PaymentRow>(&sql, id.into(), "load payment")
            .await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn payment_for_withdrawal(
        &mut self,
        withdrawal_id: WithdrawalId,
    ) -> StoreResult<Option<Payment>> {
        let sql =
            format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE withdrawal_id = $1 FOR UPDATE");
        self.fetch_optional::<PaymentRow>(&sql, withdrawal_id.into(), "load withdrawal payment")
            .await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn payments_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at, id"
        );
        let rows = self
            .fetch_all::<PaymentRow>(&sql, user_id.into(), "list payments")
            .await?;
        convert_all(rows)
    }

    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(payment.id))
            .bind(Uuid::from(payment.user_id))
            .bind(payment.campaign_id.map(Uuid::from))
            .bind(payment.withdrawal_id.map(Uuid::from))
            .bind(payment.amount)
            .bind(payment.payment_type.as_str())
            .bind(payment.status.as_str())
            .bind(&payment.transaction_id)
            .bind(payment.created_at)
            .bind(payment.completed_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("insert payment"))?;
        Ok(())
    }

    async fn update_payment(&mut self, payment: &Payment) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE payments SET status = $2, transaction_id = $3, completed_at = $4 WHERE id = $1",
        )
        .bind(Uuid::from(payment.id))
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error("update payment"))?;

        expect_one_row(result.rows_affected(), "Payment", payment.id)
    }

    async fn completed_commission_total(&mut self, user_id: UserId) -> StoreResult<Decimal> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments \
             WHERE user_id = $1 AND payment_type = $2 AND status = $3",
        )
        .bind(Uuid::from(user_id))
        .bind(PaymentType::Commission.as_str())
        .bind(PaymentStatus::Completed.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error("sum completed commissions"))
    }
}

impl WithdrawalRepository for PgUnitOfWork {
    #[instrument(skip(self), fields(marketer_id = %marketer_id), level = "debug")]
    async fn lock_marketer(&mut self, marketer_id: MarketerId) -> StoreResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(marketer_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("lock marketer"))?;

        debug!("Marketer lock acquired");
        Ok(())
    }

    async fn withdrawal(&mut self, id: WithdrawalId) -> StoreResult<Option<WithdrawalRequest>> {
        let sql = format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE id = $1 FOR UPDATE"
        );
        self.fetch_optional::<WithdrawalRow>(&sql, id.into(), "load withdrawal")
            .await?
            .map(WithdrawalRequest::try_from)
            .transpose()
    }

    async fn withdrawals_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> StoreResult<Vec<WithdrawalRequest>> {
        let sql = format!(
            "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests \
             WHERE marketer_id = $1 ORDER BY requested_at DESC, id DESC"
        );
        let rows = self
            .fetch_all::<WithdrawalRow>(&sql, marketer_id.into(), "list withdrawals")
            .await?;
        convert_all(rows)
    }

    async fn insert_withdrawal(&mut self, request: &WithdrawalRequest) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO withdrawal_requests ({WITHDRAWAL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(request.id))
            .bind(Uuid::from(request.marketer_id))
            .bind(request.amount)
            .bind(Uuid::from(request.payment_method_id))
            .bind(request.status.as_str())
            .bind(request.requested_at)
            .bind(request.processed_at)
            .bind(request.processed_by.map(Uuid::from))
            .bind(&request.rejection_reason)
            .bind(&request.failure_reason)
            .bind(&request.admin_notes)
            .bind(&request.transaction_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("insert withdrawal"))?;
        Ok(())
    }

    async fn update_withdrawal(&mut self, request: &WithdrawalRequest) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE withdrawal_requests SET status = $2, processed_at = $3, processed_by = $4, \
             rejection_reason = $5, failure_reason = $6, admin_notes = $7, transaction_id = $8 \
             WHERE id = $1",
        )
        .bind(Uuid::from(request.id))
        .bind(request.status.as_str())
        .bind(request.processed_at)
        .bind(request.processed_by.map(Uuid::from))
        .bind(&request.rejection_reason)
        .bind(&request.failure_reason)
        .bind(&request.admin_notes)
        .bind(&request.transaction_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error("update withdrawal"))?;

        expect_one_row(result.rows_affected(), "WithdrawalRequest", request.id)
    }

    async fn withdrawal_totals(&mut self, marketer_id: MarketerId) -> StoreResult<WithdrawalTotals> {
        let (completed, in_flight) = sqlx::query_as::<_, (Decimal, Decimal)>(
            "SELECT \
                 COALESCE(SUM(amount) FILTER (WHERE status = $2), 0), \
                 COALESCE(SUM(amount) FILTER (WHERE status = ANY($3)), 0) \
             FROM withdrawal_requests WHERE marketer_id = $1",
        )
        .bind(Uuid::from(marketer_id))
        .bind(WithdrawalStatus::Completed.as_str())
        .bind(in_flight_statuses())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error("sum withdrawals"))?;

        Ok(WithdrawalTotals {
            completed,
            in_flight,
        })
    }
}

impl PaymentMethodRepository for PgUnitOfWork {
    async fn payment_method(&mut self, id: PaymentMethodId) -> StoreResult<Option<PaymentMethod>> {
        let sql = format!(
            "SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE id = $1 FOR UPDATE"
        );
        self.fetch_optional::<PaymentMethodRow>(&sql, id.into(), "load payment method")
            .await?
            .map(PaymentMethod::try_from)
            .transpose()
    }

    async fn payment_methods_for_marketer(
        &mut self,
        marketer_id: MarketerId,
    ) -> StoreResult<Vec<PaymentMethod>> {
        let sql = format!(
            "SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods \
             WHERE marketer_id = $1 ORDER BY created_at, id"
        );
        let rows = self
            .fetch_all::<PaymentMethodRow>(&sql, marketer_id.into(), "list payment methods")
            .await?;
        convert_all(rows)
    }

    async fn insert_payment_method(&mut self, method: &PaymentMethod) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO payment_methods ({PAYMENT_METHOD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        sqlx::query(&sql)
            .bind(Uuid::from(method.id))
            .bind(Uuid::from(method.marketer_id))
            .bind(method.method_type.as_str())
            .bind(&method.account_details)
            .bind(&method.account_holder_name)
            .bind(method.is_default)
            .bind(method.is_verified)
            .bind(method.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("insert payment method"))?;
        Ok(())
    }

    async fn update_payment_method(&mut self, method: &PaymentMethod) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE payment_methods SET account_details = $2, account_holder_name = $3, \
             is_default = $4, is_verified = $5 WHERE id = $1",
        )
        .bind(Uuid::from(method.id))
        .bind(&method.account_details)
        .bind(&method.account_holder_name)
        .bind(method.is_default)
        .bind(method.is_verified)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error("update payment method"))?;

        expect_one_row(result.rows_affected(), "PaymentMethod", method.id)
    }

    async fn clear_default_payment_method(&mut self, marketer_id: MarketerId) -> StoreResult<()> {
        sqlx::query("UPDATE payment_methods SET is_default = FALSE WHERE marketer_id = $1")
            .bind(Uuid::from(marketer_id))
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("clear default payment method"))?;
        Ok(())
    }

    async fn delete_payment_method(&mut self, id: PaymentMethodId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error("delete payment method"))?;

        expect_one_row(result.rows_affected(), "PaymentMethod", id)
    }

    async fn payment_method_in_use(&mut self, id: PaymentMethodId) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM withdrawal_requests \
             WHERE payment_method_id = $1 AND status = ANY($2))",
        )
        .bind(Uuid::from(id))
        .bind(in_flight_statuses())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error("check payment method usage"))
    }
}
