//! SQLite-backed job store.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;
use crate::models::{Category, JobPosting, PostingCandidate};
use crate::storage::{JobPage, JobQuery, UpsertOutcome};

const COLUMNS: &str = "id, category, title, company_location, salary, posted, skills, \
                       eligible_years, apply_url, company_logo, created_at, updated_at";

/// SQLite store for job postings, shared across the server via its pool.
#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Connect to the database at `url`, creating the file if missing.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests.
    ///
    /// Uses a single connection: every pooled connection to `:memory:`
    /// would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect("sqlite::memory:", 1).await?;
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the `jobs` table and its natural-key index if absent.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                category         TEXT NOT NULL,
                title            TEXT NOT NULL,
                company_location TEXT NOT NULL DEFAULT '',
                salary           TEXT NOT NULL DEFAULT '',
                posted           TEXT NOT NULL DEFAULT '',
                skills           TEXT NOT NULL DEFAULT '',
                eligible_years   TEXT NOT NULL DEFAULT '',
                apply_url        TEXT NOT NULL,
                company_logo     TEXT NOT NULL DEFAULT '',
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_natural_key \
             ON jobs (category, apply_url)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check store connectivity.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert the candidate, or refresh the mutable fields of the row
    /// sharing its `(category, apply_url)` key.
    ///
    /// Runs in a transaction so concurrent readers never observe a
    /// half-updated row. `id` and `created_at` are never touched on update.
    pub async fn upsert(&self, candidate: &PostingCandidate) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM jobs WHERE category = ? AND apply_url = ?")
                .bind(candidate.category)
                .bind(&candidate.apply_url)
                .fetch_optional(&mut *tx)
                .await?;

        let outcome = match existing {
            Some((id,)) => {
                sqlx::query(
                    r#"
                    UPDATE jobs
                    SET title = ?, company_location = ?, salary = ?, posted = ?,
                        skills = ?, eligible_years = ?, company_logo = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&candidate.title)
                .bind(&candidate.company_location)
                .bind(&candidate.salary)
                .bind(&candidate.posted)
                .bind(&candidate.skills)
                .bind(&candidate.eligible_years)
                .bind(&candidate.company_logo)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                UpsertOutcome::Updated
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO jobs (category, title, company_location, salary, posted,
                                      skills, eligible_years, apply_url, company_logo,
                                      created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(candidate.category)
                .bind(&candidate.title)
                .bind(&candidate.company_location)
                .bind(&candidate.salary)
                .bind(&candidate.posted)
                .bind(&candidate.skills)
                .bind(&candidate.eligible_years)
                .bind(&candidate.apply_url)
                .bind(&candidate.company_logo)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                UpsertOutcome::Inserted
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Return one page of postings matching the query's filters,
    /// most recently seen first.
    pub async fn query(&self, query: &JobQuery) -> Result<JobPage> {
        let (predicate, binds) = Self::build_predicate(query);

        let count_sql = format!("SELECT COUNT(*) FROM jobs{predicate}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(category) = query.category {
            count_query = count_query.bind(category);
        }
        for bind in &binds {
            count_query = count_query.bind(bind.as_str());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let page = query.page.max(1);
        let offset = (page as i64 - 1) * query.page_size as i64;
        let items_sql = format!(
            "SELECT {COLUMNS} FROM jobs{predicate} \
             ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut items_query = sqlx::query_as::<_, JobPosting>(&items_sql);
        if let Some(category) = query.category {
            items_query = items_query.bind(category);
        }
        for bind in &binds {
            items_query = items_query.bind(bind.as_str());
        }
        let items = items_query
            .bind(query.page_size as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(JobPage {
            items,
            page,
            page_size: query.page_size,
            total,
        })
    }

    /// Fetch a single posting by id, optionally constrained to a category.
    pub async fn get_by_id(&self, id: i64, category: Option<Category>) -> Result<Option<JobPosting>> {
        let row = match category {
            Some(category) => {
                sqlx::query_as::<_, JobPosting>(&format!(
                    "SELECT {COLUMNS} FROM jobs WHERE id = ? AND category = ?"
                ))
                .bind(id)
                .bind(category)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, JobPosting>(&format!(
                    "SELECT {COLUMNS} FROM jobs WHERE id = ?"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(row)
    }

    /// Total row count, used by tests and the scrape CLI summary log.
    pub async fn count(&self) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Build the WHERE clause and the string binds that follow the
    /// optional category bind. Substring matches use `instr` on lowered
    /// text so `%`/`_` in user input stay literal.
    fn build_predicate(query: &JobQuery) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if query.category.is_some() {
            clauses.push("category = ?".to_string());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            clauses.push(
                "(instr(lower(title), ?) > 0 \
                 OR instr(lower(company_location), ?) > 0 \
                 OR instr(lower(skills), ?) > 0)"
                    .to_string(),
            );
            let lowered = search.to_lowercase();
            binds.push(lowered.clone());
            binds.push(lowered.clone());
            binds.push(lowered);
        }
        if let Some(location) = query.location.as_deref().filter(|s| !s.trim().is_empty()) {
            clauses.push("instr(lower(company_location), ?) > 0".to_string());
            binds.push(location.to_lowercase());
        }

        if clauses.is_empty() {
            (String::new(), binds)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), binds)
        }
    }
}
