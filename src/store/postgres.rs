use anyhow::Context;
use axum::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    Collection, DeleteOutcome, Document, DocumentStore, Filter, InsertOutcome, StoreError, Update,
    UpdateOutcome, ID_FIELD,
};

/// JSONB-backed document store on a shared Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Ok(Self { db })
    }
}

fn filter_json(filter: &Filter) -> Json<&Document> {
    Json(filter.as_document())
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT doc
              FROM documents
             WHERE collection = $1 AND doc @> $2
             ORDER BY created_at ASC
             LIMIT 1
            "#,
        )
        .bind(collection.as_str())
        .bind(filter_json(filter))
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT doc
              FROM documents
             WHERE collection = $1 AND doc @> $2
             ORDER BY created_at ASC
            "#,
        )
        .bind(collection.as_str())
        .bind(filter_json(filter))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut doc: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let id = Uuid::new_v4();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, doc)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&doc))
        .execute(&self.db)
        .await?;

        debug!(collection = collection.as_str(), %id, "document inserted");
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateOutcome, StoreError> {
        let (matched, modified) = match update {
            Update::Set(fields) => {
                sqlx::query_as::<_, (i64, i64)>(
                    r#"
                    WITH target AS (
                        SELECT id
                          FROM documents
                         WHERE collection = $1 AND doc @> $2
                         ORDER BY created_at ASC
                         LIMIT 1
                           FOR UPDATE
                    ), updated AS (
                        UPDATE documents d
                           SET doc = d.doc || $3
                          FROM target t
                         WHERE d.collection = $1
                           AND d.id = t.id
                           AND d.doc IS DISTINCT FROM d.doc || $3
                        RETURNING d.id
                    )
                    SELECT (SELECT count(*) FROM target), (SELECT count(*) FROM updated)
                    "#,
                )
                .bind(collection.as_str())
                .bind(filter_json(filter))
                .bind(Json(fields))
                .fetch_one(&self.db)
                .await?
            }
            Update::Inc { field, by } => {
                let result = sqlx::query_as::<_, (i64, i64)>(
                    r#"
                    WITH target AS (
                        SELECT id
                          FROM documents
                         WHERE collection = $1 AND doc @> $2
                         ORDER BY created_at ASC
                         LIMIT 1
                           FOR UPDATE
                    ), updated AS (
                        UPDATE documents d
                           SET doc = jsonb_set(
                                   d.doc,
                                   ARRAY[$3::text],
                                   to_jsonb(COALESCE((d.doc ->> $3)::bigint, 0) + $4)
                               )
                          FROM target t
                         WHERE d.collection = $1 AND d.id = t.id
                        RETURNING d.id
                    )
                    SELECT (SELECT count(*) FROM target), (SELECT count(*) FROM updated)
                    "#,
                )
                .bind(collection.as_str())
                .bind(filter_json(filter))
                .bind(field)
                .bind(*by)
                .fetch_one(&self.db)
                .await;

                match result {
                    Ok(counts) => counts,
                    // 22P02: the field isn't numeric; 22003: it overflows bigint
                    Err(sqlx::Error::Database(e))
                        if matches!(e.code().as_deref(), Some("22P02" | "22003")) =>
                    {
                        return Err(StoreError::NotAnInteger {
                            field: field.clone(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: matched as u64,
            modified_count: modified as u64,
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
             WHERE collection = $1
               AND id = (
                   SELECT id
                     FROM documents
                    WHERE collection = $1 AND doc @> $2
                    ORDER BY created_at ASC
                    LIMIT 1
               )
            "#,
        )
        .bind(collection.as_str())
        .bind(filter_json(filter))
        .execute(&self.db)
        .await?;

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn close(&self) {
        self.db.close().await;
        info!("database pool closed");
    }
}
