use anyhow::{bail, Context, Result};
use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder, Row};

use crate::model::{
    apply_updates, Collection, DeleteResult, Document, FieldUpdate, FilterExpr, UpdateResult,
};
use crate::store::traits::{check_updates, prepare_insert, touch, EntityStore};

/// Entity store backed by a single JSONB `documents` table
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the documents table and its indexes when missing
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq BIGSERIAL NOT NULL,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create documents table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS documents_collection_seq ON documents (collection, seq)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create documents index")?;

        sqlx::query(
            r#"
            CREATE OR REPLACE FUNCTION field_values(field JSONB) RETURNS JSONB
            LANGUAGE sql IMMUTABLE AS $$
                SELECT CASE
                    WHEN field IS NULL THEN '[]'::jsonb
                    WHEN jsonb_typeof(field) = 'array' THEN field
                    ELSE jsonb_build_array(field)
                END
            $$
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create field_values function")?;

        Ok(())
    }
}

/// Build the `SELECT` used by `find_many`
pub fn select_query(
    collection: Collection,
    filter: &FilterExpr,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
    builder.push_bind(collection.as_str());
    builder.push(" AND ");
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY seq");
    builder
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

/// Translate a filter into a SQL boolean expression over `body`
fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &FilterExpr) {
    match filter {
        FilterExpr::All { all } if all.is_empty() => {
            builder.push("TRUE");
        }
        FilterExpr::Any { any } if any.is_empty() => {
            builder.push("FALSE");
        }
        FilterExpr::All { all } => push_joined(builder, all, " AND "),
        FilterExpr::Any { any } => push_joined(builder, any, " OR "),
        FilterExpr::Eq { eq: (path, value) } => {
            push_any_value(builder, &path.0);
            builder.push("element.value = ");
            builder.push_bind(Json(value.clone()));
            builder.push(")");
        }
        FilterExpr::In { r#in: (_, values) } if values.is_empty() => {
            builder.push("FALSE");
        }
        FilterExpr::In { r#in: (path, values) } => {
            push_any_value(builder, &path.0);
            builder.push("element.value IN (");
            let mut separated = builder.separated(", ");
            for value in values {
                separated.push_bind(Json(value.clone()));
            }
            separated.push_unseparated("))");
        }
        FilterExpr::Matches {
            matches: (path, pattern),
        } => {
            push_any_value(builder, &path.0);
            builder.push("jsonb_typeof(element.value) = 'string' AND (element.value #>> '{}')");
            builder.push(if pattern.case_insensitive { " ~* " } else { " ~ " });
            builder.push_bind(pattern.regex.clone());
            builder.push(")");
        }
    }
}

fn push_joined(
    builder: &mut QueryBuilder<'static, Postgres>,
    predicates: &[FilterExpr],
    glue: &str,
) {
    builder.push("(");
    for (index, predicate) in predicates.iter().enumerate() {
        if index > 0 {
            builder.push(glue);
        }
        push_filter(builder, predicate);
    }
    builder.push(")");
}

/// Open an `EXISTS` over the values of a field: the field itself, or each element
/// when it holds an array. The caller pushes the condition on `element.value` and
/// closes the parenthesis.
fn push_any_value(builder: &mut QueryBuilder<'static, Postgres>, path: &str) {
    builder.push("EXISTS (SELECT 1 FROM jsonb_array_elements(field_values(body #> ");
    builder.push_bind(path_segments(path));
    builder.push(")) AS element(value) WHERE ");
}

#[async_trait::async_trait]
impl EntityStore for PostgresStore {
    async fn find_many(
        &self,
        collection: Collection,
        filter: &FilterExpr,
    ) -> Result<Vec<Document>> {
        let rows = select_query(collection, filter)
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query {}", collection))?;

        rows.into_iter()
            .map(|row| -> Result<Document> {
                let body: Json<Document> = row.try_get("body")?;
                Ok(body.0)
            })
            .collect()
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch from {}", collection))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let body: Json<Document> = row.try_get("body")?;
        Ok(Some(body.0))
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<Document> {
        let document = prepare_insert(document);
        let id = document.id().unwrap_or_default().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(Json(&document))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert into {}", collection))?;

        if result.rows_affected() == 0 {
            bail!("Duplicate key: '{}' already exists in {}", id, collection);
        }

        Ok(document)
    }

    async fn update_one(
        &self,
        collection: Collection,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<UpdateResult> {
        check_updates(updates)?;

        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        let row = sqlx::query(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("Failed to fetch from {}", collection))?;

        let Some(row) = row else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let Json(mut document): Json<Document> = row.try_get("body")?;
        let modified = apply_updates(&mut document, updates);

        if modified {
            touch(&mut document);
            sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .bind(Json(&document))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to update {}", collection))?;
        }

        tx.commit().await.context("Failed to commit update")?;

        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: Collection, id: &str) -> Result<DeleteResult> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete from {}", collection))?;

        Ok(DeleteResult {
            deleted_count: result.rows_affected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_selects_whole_collection() {
        let builder = select_query(Collection::People, &FilterExpr::always());
        assert_eq!(
            builder.sql(),
            "SELECT body FROM documents WHERE collection = $1 AND TRUE ORDER BY seq"
        );
    }

    #[test]
    fn composed_filter_translates_to_sql() {
        let filter = FilterExpr::all(vec![
            FilterExpr::eq("role", "child"),
            FilterExpr::id_in(&["a".to_string(), "b".to_string()]),
            FilterExpr::any(vec![
                FilterExpr::matches_ignore_case("firstName", "marie"),
                FilterExpr::matches("lastName", "Dupond"),
            ]),
        ]);
        let builder = select_query(Collection::People, &filter);
        assert_eq!(
            builder.sql(),
            "SELECT body FROM documents WHERE collection = $1 AND \
             (EXISTS (SELECT 1 FROM jsonb_array_elements(field_values(body #> $2)) \
             AS element(value) WHERE element.value = $3) AND \
             EXISTS (SELECT 1 FROM jsonb_array_elements(field_values(body #> $4)) \
             AS element(value) WHERE element.value IN ($5, $6)) AND \
             (EXISTS (SELECT 1 FROM jsonb_array_elements(field_values(body #> $7)) \
             AS element(value) WHERE jsonb_typeof(element.value) = 'string' AND \
             (element.value #>> '{}') ~* $8) OR \
             EXISTS (SELECT 1 FROM jsonb_array_elements(field_values(body #> $9)) \
             AS element(value) WHERE jsonb_typeof(element.value) = 'string' AND \
             (element.value #>> '{}') ~ $10))) \
             ORDER BY seq"
        );
    }

    #[test]
    fn equality_tests_each_array_element() {
        let builder = select_query(Collection::Courses, &FilterExpr::eq("absence", "kid"));
        assert_eq!(
            builder.sql(),
            "SELECT body FROM documents WHERE collection = $1 AND \
             EXISTS (SELECT 1 FROM jsonb_array_elements(field_values(body #> $2)) \
             AS element(value) WHERE element.value = $3) ORDER BY seq"
        );
    }

    #[test]
    fn empty_membership_is_false() {
        let builder = select_query(Collection::Courses, &FilterExpr::id_in(&[]));
        assert_eq!(
            builder.sql(),
            "SELECT body FROM documents WHERE collection = $1 AND FALSE ORDER BY seq"
        );
    }
}
