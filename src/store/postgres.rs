// src/store/postgres.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::{ArticleStore, ResolvedSource};
use crate::ingest::types::NormalizedArticle;
use crate::text::{slugify, title_case};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connecting to postgres")?;
        info!("connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Idempotent schema bootstrap.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating categories table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT,
                url TEXT,
                category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating sources table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS source_aliases (
                id BIGSERIAL PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                source_id BIGINT NOT NULL REFERENCES sources(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating source_aliases table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS authors (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                source_id BIGINT NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
                UNIQUE (name, source_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating authors table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGSERIAL PRIMARY KEY,
                source_id BIGINT REFERENCES sources(id) ON DELETE SET NULL,
                category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                description TEXT,
                content TEXT,
                url TEXT NOT NULL UNIQUE,
                image_url TEXT,
                published_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating articles table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at)",
        )
        .execute(&self.pool)
        .await
        .context("creating articles index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS article_author (
                article_id BIGINT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
                author_id BIGINT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                PRIMARY KEY (article_id, author_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating article_author table")?;

        Ok(())
    }

    /// Find-or-create a category by slug; the display name is title-cased.
    pub async fn upsert_category(&self, label: &str) -> Result<i64> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO categories (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING id
            "#,
        )
        .bind(title_case(label))
        .bind(slugify(label))
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("upserting category {label}"))?;
        Ok(id)
    }

    /// Create or update a source row keyed by slug. Seed-time only; the
    /// pipeline itself never writes to this table.
    pub async fn upsert_source(
        &self,
        slug: &str,
        name: &str,
        description: Option<&str>,
        url: Option<&str>,
        category_id: i64,
    ) -> Result<i64> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO sources (name, slug, description, url, category_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                url = EXCLUDED.url,
                category_id = EXCLUDED.category_id
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(url)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("upserting source {slug}"))?;
        Ok(id)
    }

    /// Register an alias slug for a source; returns whether a row was added.
    pub async fn ensure_alias(&self, alias_slug: &str, source_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO source_aliases (slug, source_id) VALUES ($1, $2)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(alias_slug)
        .bind(source_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("inserting source alias {alias_slug}"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn resolve_alias(&self, alias_slug: &str) -> Result<Option<ResolvedSource>> {
        let row = sqlx::query(
            r#"
            SELECT s.id AS source_id, c.name AS category_name
            FROM source_aliases sa
            JOIN sources s ON s.id = sa.source_id
            LEFT JOIN categories c ON c.id = s.category_id
            WHERE sa.slug = $1
            "#,
        )
        .bind(alias_slug)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("resolving source alias {alias_slug}"))?;

        Ok(row.map(|r| ResolvedSource {
            source_id: r.get("source_id"),
            category_name: r.get("category_name"),
        }))
    }

    async fn persist_article(
        &self,
        article: &NormalizedArticle,
        source: &ResolvedSource,
        category_label: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("starting transaction")?;

        let category_id: Option<i64> = match category_label {
            Some(label) => {
                let id = sqlx::query_scalar(
                    r#"
                    INSERT INTO categories (name, slug) VALUES ($1, $2)
                    ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
                    RETURNING id
                    "#,
                )
                .bind(title_case(label))
                .bind(slugify(label))
                .fetch_one(&mut *tx)
                .await
                .with_context(|| format!("upserting category {label}"))?;
                Some(id)
            }
            None => None,
        };

        let published_at = article.published_at().and_then(parse_published_at);

        let article_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO articles
                (source_id, category_id, title, description, content, url, image_url, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (url) DO UPDATE SET
                source_id = EXCLUDED.source_id,
                category_id = EXCLUDED.category_id,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                content = EXCLUDED.content,
                image_url = EXCLUDED.image_url,
                published_at = EXCLUDED.published_at,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(source.source_id)
        .bind(category_id)
        .bind(article.title())
        .bind(article.description())
        .bind(article.content())
        .bind(article.url())
        .bind(article.image_url())
        .bind(published_at)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("upserting article {}", article.url()))?;

        let mut author_ids: Vec<i64> = Vec::with_capacity(article.authors().len());
        for name in article.authors() {
            let author_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO authors (name, source_id) VALUES ($1, $2)
                ON CONFLICT (name, source_id) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(name)
            .bind(source.source_id)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("upserting author {name}"))?;
            author_ids.push(author_id);
        }

        // Sync, not append: authors absent from this run are detached.
        sqlx::query("DELETE FROM article_author WHERE article_id = $1 AND author_id <> ALL($2)")
            .bind(article_id)
            .bind(&author_ids)
            .execute(&mut *tx)
            .await
            .context("detaching stale authors")?;

        for author_id in &author_ids {
            sqlx::query(
                r#"
                INSERT INTO article_author (article_id, author_id) VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(article_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .context("attaching author")?;
        }

        tx.commit().await.context("committing article upsert")?;
        debug!(url = article.url(), "article persisted");
        Ok(())
    }
}

/// Providers disagree on timestamp shape, so parsing is tolerant: RFC 3339,
/// then offset-without-colon, then a bare datetime taken as UTC. Anything
/// else persists as NULL.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}
