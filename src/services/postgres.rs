use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

use crate::models::{
    Decision, EmployerInterest, FilterSpec, JobMatch, JobPosting, JobStatus, JobType, PayType,
    SwipeDecision,
};
use crate::services::store::{
    CatalogStore, FilterValues, MatchInsert, ReserveOutcome, StoreError,
};

const POSTING_COLUMNS: &str = "id, employer_id, title, description, job_type, location, \
     province, latitude, longitude, salary_min, salary_max, pay_type, skills, \
     experience_years, languages, schedule, boosted, boost_expires_at, status, \
     expires_at, created_at, updated_at";

/// PostgreSQL-backed catalog store.
///
/// Holds every table the engine depends on; the uniqueness constraints in the
/// schema (swipe per pair, match per pair, quota row per seeker-day) are what
/// make the conditional writes here race-safe without application locks.
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Create a new catalog from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new catalog from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL with URL: {}", url);

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
        )
        .await
    }
}

fn posting_from_row(row: &PgRow) -> Result<JobPosting, StoreError> {
    let job_type_raw: String = row.try_get("job_type")?;
    let job_type = JobType::parse(&job_type_raw)
        .ok_or_else(|| StoreError::InvalidRow(format!("unknown job_type: {}", job_type_raw)))?;

    let pay_type_raw: String = row.try_get("pay_type")?;
    let pay_type = PayType::parse(&pay_type_raw)
        .ok_or_else(|| StoreError::InvalidRow(format!("unknown pay_type: {}", pay_type_raw)))?;

    let status_raw: String = row.try_get("status")?;
    let status = JobStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::InvalidRow(format!("unknown status: {}", status_raw)))?;

    let schedule_json: serde_json::Value = row.try_get("schedule")?;
    let schedule = serde_json::from_value(schedule_json)
        .map_err(|e| StoreError::InvalidRow(format!("bad schedule payload: {}", e)))?;

    Ok(JobPosting {
        id: row.try_get("id")?,
        employer_id: row.try_get("employer_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        job_type,
        location: row.try_get("location")?,
        province: row.try_get("province")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        salary_min: row.try_get("salary_min")?,
        salary_max: row.try_get("salary_max")?,
        pay_type,
        skills: row.try_get("skills")?,
        experience_years: row.try_get("experience_years")?,
        languages: row.try_get("languages")?,
        schedule,
        boosted: row.try_get("boosted")?,
        boost_expires_at: row.try_get("boost_expires_at")?,
        status,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<JobMatch, StoreError> {
    Ok(JobMatch {
        id: row.try_get("id")?,
        seeker_id: row.try_get("seeker_id")?,
        posting_id: row.try_get("posting_id")?,
        employer_id: row.try_get("employer_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    async fn feed_page(
        &self,
        spec: &FilterSpec,
        exclude: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<JobPosting>, StoreError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM job_postings WHERE status = 'active' AND (expires_at IS NULL OR expires_at > ",
            POSTING_COLUMNS
        ));
        query.push_bind(now).push(")");

        if let Some(location) = &spec.location {
            query.push(" AND location = ").push_bind(location);
        }
        if let Some(job_type) = &spec.job_type {
            query.push(" AND job_type = ").push_bind(job_type);
        }
        if let Some(pay_type) = &spec.pay_type {
            query.push(" AND pay_type = ").push_bind(pay_type);
        }
        if let Some(keyword) = &spec.keyword {
            // Normalization strips %, _ and \ from the keyword, so the ILIKE
            // pattern stays a plain case-insensitive substring.
            query
                .push(" AND (title ILIKE '%' || ")
                .push_bind(keyword)
                .push(" || '%' OR description ILIKE '%' || ")
                .push_bind(keyword)
                .push(" || '%')");
        }
        if !exclude.is_empty() {
            query.push(" AND id <> ALL(").push_bind(exclude.to_vec()).push(")");
        }

        query.push(" ORDER BY (boosted AND (boost_expires_at IS NULL OR boost_expires_at > ");
        query.push_bind(now);
        query.push(")) DESC, created_at DESC, id DESC LIMIT ");
        query.push_bind(spec.limit());
        query.push(" OFFSET ");
        query.push_bind(spec.offset());

        let rows = query.build().fetch_all(&self.pool).await?;

        tracing::debug!("Feed query returned {} postings", rows.len());

        rows.iter().map(posting_from_row).collect()
    }

    async fn filter_values(&self, now: DateTime<Utc>) -> Result<FilterValues, StoreError> {
        let locations: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT location FROM job_postings
            WHERE status = 'active' AND (expires_at IS NULL OR expires_at > $1)
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let job_types: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT job_type FROM job_postings
            WHERE status = 'active' AND (expires_at IS NULL OR expires_at > $1)
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(FilterValues {
            locations,
            job_types,
        })
    }

    async fn employer_postings(
        &self,
        employer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<JobPosting>, StoreError> {
        let query = format!(
            r#"
            SELECT {} FROM job_postings
            WHERE employer_id = $1
              AND status = 'active'
              AND (expires_at IS NULL OR expires_at > $2)
            ORDER BY created_at DESC, id DESC
            "#,
            POSTING_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(employer_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(posting_from_row).collect()
    }

    async fn get_posting(&self, posting_id: &str) -> Result<Option<JobPosting>, StoreError> {
        let query = format!("SELECT {} FROM job_postings WHERE id = $1", POSTING_COLUMNS);

        let row = sqlx::query(&query)
            .bind(posting_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(posting_from_row).transpose()
    }

    async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        let query = format!(
            r#"
            INSERT INTO job_postings ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
            POSTING_COLUMNS
        );

        sqlx::query(&query)
            .bind(&posting.id)
            .bind(&posting.employer_id)
            .bind(&posting.title)
            .bind(&posting.description)
            .bind(posting.job_type.as_str())
            .bind(&posting.location)
            .bind(&posting.province)
            .bind(posting.latitude)
            .bind(posting.longitude)
            .bind(posting.salary_min)
            .bind(posting.salary_max)
            .bind(posting.pay_type.as_str())
            .bind(&posting.skills)
            .bind(posting.experience_years)
            .bind(&posting.languages)
            .bind(serde_json::to_value(&posting.schedule)?)
            .bind(posting.boosted)
            .bind(posting.boost_expires_at)
            .bind(posting.status.as_str())
            .bind(posting.expires_at)
            .bind(posting.created_at)
            .bind(posting.updated_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Inserted posting {} for employer {}",
            posting.id,
            posting.employer_id
        );

        Ok(())
    }

    async fn update_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        let query = r#"
            UPDATE job_postings SET
                title = $2,
                description = $3,
                job_type = $4,
                location = $5,
                province = $6,
                latitude = $7,
                longitude = $8,
                salary_min = $9,
                salary_max = $10,
                pay_type = $11,
                skills = $12,
                experience_years = $13,
                languages = $14,
                schedule = $15,
                boosted = $16,
                boost_expires_at = $17,
                status = $18,
                expires_at = $19,
                updated_at = $20
            WHERE id = $1
        "#;

        sqlx::query(query)
            .bind(&posting.id)
            .bind(&posting.title)
            .bind(&posting.description)
            .bind(posting.job_type.as_str())
            .bind(&posting.location)
            .bind(&posting.province)
            .bind(posting.latitude)
            .bind(posting.longitude)
            .bind(posting.salary_min)
            .bind(posting.salary_max)
            .bind(posting.pay_type.as_str())
            .bind(&posting.skills)
            .bind(posting.experience_years)
            .bind(&posting.languages)
            .bind(serde_json::to_value(&posting.schedule)?)
            .bind(posting.boosted)
            .bind(posting.boost_expires_at)
            .bind(posting.status.as_str())
            .bind(posting.expires_at)
            .bind(posting.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_posting_status(
        &self,
        posting_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE job_postings SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(posting_id)
            .bind(status.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn swiped_posting_ids(&self, seeker_id: &str) -> Result<Vec<String>, StoreError> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT posting_id FROM swipe_decisions WHERE seeker_id = $1")
                .bind(seeker_id)
                .fetch_all(&self.pool)
                .await?;

        tracing::debug!("Seeker {} has swiped {} postings", seeker_id, ids.len());

        Ok(ids)
    }

    async fn quota_consumed(&self, seeker_id: &str, day: NaiveDate) -> Result<i64, StoreError> {
        let consumed: Option<i64> = sqlx::query_scalar(
            "SELECT consumed FROM swipe_quotas WHERE seeker_id = $1 AND quota_day = $2",
        )
        .bind(seeker_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(consumed.unwrap_or(0))
    }

    async fn reserve_and_record_swipe(
        &self,
        seeker_id: &str,
        posting_id: &str,
        decision: Decision,
        day: NaiveDate,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<ReserveOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Single conditional compare-and-increment on the (seeker, day) row.
        // A raised tier limit takes effect immediately via GREATEST; a lowered
        // one waits for the next day so consumed never exceeds the stored
        // limit. No row comes back when the count is already at the limit.
        let reserved: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO swipe_quotas (seeker_id, quota_day, consumed, daily_limit, updated_at)
            VALUES ($1, $2, 1, $3, $4)
            ON CONFLICT (seeker_id, quota_day)
            DO UPDATE SET
                consumed = swipe_quotas.consumed + 1,
                daily_limit = GREATEST(swipe_quotas.daily_limit, EXCLUDED.daily_limit),
                updated_at = EXCLUDED.updated_at
            WHERE swipe_quotas.consumed
                < GREATEST(swipe_quotas.daily_limit, EXCLUDED.daily_limit)
            RETURNING consumed
            "#,
        )
        .bind(seeker_id)
        .bind(day)
        .bind(limit)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(consumed) = reserved else {
            tx.rollback().await?;
            let consumed = self.quota_consumed(seeker_id, day).await?;
            return Ok(ReserveOutcome {
                admitted: false,
                consumed,
            });
        };

        // The swipe upsert commits together with the reservation, so a failed
        // write never consumes a slot. A repeat swipe on the same pair
        // supersedes the stored decision instead of duplicating it.
        sqlx::query(
            r#"
            INSERT INTO swipe_decisions (seeker_id, posting_id, decision, decided_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (seeker_id, posting_id)
            DO UPDATE SET
                decision = EXCLUDED.decision,
                decided_at = EXCLUDED.decided_at
            "#,
        )
        .bind(seeker_id)
        .bind(posting_id)
        .bind(decision.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            "Recorded swipe: {} -> {} ({:?}), consumed {}/{}",
            seeker_id,
            posting_id,
            decision,
            consumed,
            limit
        );

        Ok(ReserveOutcome {
            admitted: true,
            consumed,
        })
    }

    async fn swipe_decision(
        &self,
        seeker_id: &str,
        posting_id: &str,
    ) -> Result<Option<SwipeDecision>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT seeker_id, posting_id, decision, decided_at
            FROM swipe_decisions
            WHERE seeker_id = $1 AND posting_id = $2
            "#,
        )
        .bind(seeker_id)
        .bind(posting_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let decision_raw: String = row.try_get("decision")?;
            let decision = Decision::parse(&decision_raw).ok_or_else(|| {
                StoreError::InvalidRow(format!("unknown decision: {}", decision_raw))
            })?;

            Ok(SwipeDecision {
                seeker_id: row.try_get("seeker_id")?,
                posting_id: row.try_get("posting_id")?,
                decision,
                decided_at: row.try_get("decided_at")?,
            })
        })
        .transpose()
    }

    async fn employer_interest(
        &self,
        posting_id: &str,
        seeker_id: &str,
    ) -> Result<Option<EmployerInterest>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT posting_id, seeker_id, employer_id, created_at
            FROM employer_interests
            WHERE posting_id = $1 AND seeker_id = $2
            "#,
        )
        .bind(posting_id)
        .bind(seeker_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(EmployerInterest {
                posting_id: row.try_get("posting_id")?,
                seeker_id: row.try_get("seeker_id")?,
                employer_id: row.try_get("employer_id")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn put_interest(&self, interest: &EmployerInterest) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employer_interests (posting_id, seeker_id, employer_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (posting_id, seeker_id) DO NOTHING
            "#,
        )
        .bind(&interest.posting_id)
        .bind(&interest.seeker_id)
        .bind(&interest.employer_id)
        .bind(interest.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_match(&self, job_match: &JobMatch) -> Result<MatchInsert, StoreError> {
        // Conditional insert on the (seeker, posting) primary key; the loser
        // of a concurrent race reads back the winner's row.
        let result = sqlx::query(
            r#"
            INSERT INTO job_matches (id, seeker_id, posting_id, employer_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (seeker_id, posting_id) DO NOTHING
            "#,
        )
        .bind(&job_match.id)
        .bind(&job_match.seeker_id)
        .bind(&job_match.posting_id)
        .bind(&job_match.employer_id)
        .bind(job_match.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(
                "Created match {} for seeker {} on posting {}",
                job_match.id,
                job_match.seeker_id,
                job_match.posting_id
            );
            return Ok(MatchInsert::Created(job_match.clone()));
        }

        let row = sqlx::query(
            r#"
            SELECT id, seeker_id, posting_id, employer_id, created_at
            FROM job_matches
            WHERE seeker_id = $1 AND posting_id = $2
            "#,
        )
        .bind(&job_match.seeker_id)
        .bind(&job_match.posting_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(MatchInsert::Existing(match_from_row(&row)?))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
