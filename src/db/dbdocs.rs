use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{AccessLevel, DocumentRecord};
use crate::storage::{DocumentStore, StoreError};

/// Document row from the database
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    content: serde_json::Value,
    title: String,
    parent_folder: Option<Uuid>,
}

impl From<DocumentRow> for DocumentRecord {
    fn from(row: DocumentRow) -> Self {
        DocumentRecord {
            content: row.content,
            title: row.title,
            parent_folder: row.parent_folder.map(|id| id.to_string()),
        }
    }
}

/// PostgreSQL-backed `DocumentStore`
pub struct DbDocs {
    pool: PgPool,
}

impl DbDocs {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // Close idle connections after 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // Recycle connections after 30 minutes
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    fn parse_document_id(document_id: &str) -> Option<Uuid> {
        match Uuid::parse_str(document_id) {
            Ok(uuid) => Some(uuid),
            Err(e) => {
                warn!("Invalid document UUID '{}': {}", document_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl DocumentStore for DbDocs {
    async fn fetch_snapshot(&self, document_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let Some(doc_uuid) = Self::parse_document_id(document_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT content, title, parent_folder
            FROM documents
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(doc_uuid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DocumentRecord::from))
    }

    async fn create_document(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<DocumentRecord, StoreError> {
        let Some(doc_uuid) = Self::parse_document_id(document_id) else {
            return Err(StoreError::Unavailable(format!(
                "invalid document id '{}'",
                document_id
            )));
        };

        info!(
            "Creating document {} for '{}'. Pool connections: {} idle, {} total",
            doc_uuid,
            identity,
            self.pool.num_idle(),
            self.pool.size()
        );

        let mut tx = self.pool.begin().await.map_err(StoreError::Database)?;

        let empty = DocumentRecord::empty();
        sqlx::query(
            r#"
            INSERT INTO documents (id, title, content, owner, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(doc_uuid)
        .bind(&empty.title)
        .bind(&empty.content)
        .bind(identity)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT content, title, parent_folder
            FROM documents
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(doc_uuid)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn fetch_access_level(
        &self,
        document_id: &str,
        identity: &str,
    ) -> Result<AccessLevel, StoreError> {
        let Some(doc_uuid) = Self::parse_document_id(document_id) else {
            return Ok(AccessLevel::None);
        };

        // Ownership wins over any explicit grant.
        let access: String = sqlx::query_scalar(
            r#"
            SELECT COALESCE(
                (SELECT 'creator' FROM documents d WHERE d.id = $1 AND d.owner = $2),
                (SELECT a.access FROM document_access a WHERE a.document = $1 AND a.identity = $2),
                'none'
            )
            "#,
        )
        .bind(doc_uuid)
        .bind(identity)
        .fetch_one(&self.pool)
        .await?;

        Ok(AccessLevel::parse(&access))
    }

    async fn persist(
        &self,
        document_id: &str,
        content: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let Some(doc_uuid) = Self::parse_document_id(document_id) else {
            return Err(StoreError::Unavailable(format!(
                "invalid document id '{}'",
                document_id
            )));
        };

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET content = $2, updated_at = now()
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(doc_uuid)
        .bind(content)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            error!("Persist for document '{}' matched no rows", doc_uuid);
            return Err(StoreError::Unavailable(format!(
                "document '{}' not found",
                doc_uuid
            )));
        }

        Ok(())
    }
}
