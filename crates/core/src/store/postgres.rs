use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::document::{new_id, Document, DocumentRow, Fields};
use crate::store::{Condition, DocumentStore, Filter, KeyCount, Sort, StoreError, StoreResult};

const COLUMNS: &str = "seq, id, collection, content, created_at, updated_at";

/// Separates collection and field inside generated unique index names.
const INDEX_FIELD_SEPARATOR: &str = "__";

/// PostgreSQL store. All collections share the `documents` table; content is
/// JSONB and filters compile to JSONB operators with bound parameters.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = db_err
                .constraint()
                .and_then(|name| name.rsplit(INDEX_FIELD_SEPARATOR).next())
                .unwrap_or("id")
                .to_string();
            return StoreError::UniqueViolation {
                collection: collection.to_string(),
                field,
            };
        }
    }
    StoreError::Database(err)
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for condition in &filter.conditions {
        match condition {
            Condition::Eq(field, value) => {
                qb.push(" AND content -> ");
                qb.push_bind(field.clone());
                qb.push(" = ");
                qb.push_bind(Json(value.clone()));
            }
            Condition::Matches { fields, pattern } => {
                if fields.is_empty() {
                    qb.push(" AND FALSE");
                    continue;
                }
                qb.push(" AND (");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push("content ->> ");
                    qb.push_bind(field.clone());
                    qb.push(" ~* ");
                    qb.push_bind(pattern.clone());
                }
                qb.push(")");
            }
        }
    }
}

fn push_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: &Sort) {
    match sort {
        Sort::Insertion => {
            qb.push(" ORDER BY seq ASC");
        }
        Sort::Newest => {
            qb.push(" ORDER BY seq DESC");
        }
        Sort::Asc(field) => {
            qb.push(" ORDER BY NULLIF(content -> ");
            qb.push_bind(field.clone());
            qb.push(", 'null'::jsonb) ASC NULLS LAST, seq ASC");
        }
        Sort::Desc(field) => {
            qb.push(" ORDER BY NULLIF(content -> ");
            qb.push_bind(field.clone());
            qb.push(", 'null'::jsonb) DESC NULLS LAST, seq ASC");
        }
    }
}

fn select_from(collection: &str) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM documents WHERE collection = "));
    qb.push_bind(collection.to_string());
    qb
}

/// Index names and expressions are spliced into DDL, so only plain
/// identifiers are accepted.
fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(INDEX_FIELD_SEPARATOR)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: &str, filter: &Filter, sort: &Sort) -> StoreResult<Vec<Document>> {
        let mut qb = select_from(collection);
        push_filter(&mut qb, filter);
        push_sort(&mut qb, sort);
        let rows = qb.build_query_as::<DocumentRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut qb = select_from(collection);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY seq ASC LIMIT 1");
        let row = qb
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO documents (id, collection, content, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {COLUMNS}"
        ))
        .bind(new_id())
        .bind(collection)
        .bind(Json(Value::Object(fields)))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;
        Ok(row.into())
    }

    async fn update(&self, collection: &str, id: &str, set: Fields) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "UPDATE documents SET content = content || $3, updated_at = $4 \
             WHERE collection = $1 AND id = $2 RETURNING {COLUMNS}"
        ))
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(set)))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;
        Ok(row.map(Document::from))
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "UPDATE documents SET content = $3, updated_at = $4 \
             WHERE collection = $1 AND id = $2 RETURNING {COLUMNS}"
        ))
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(fields)))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;
        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "DELETE FROM documents WHERE collection = $1 AND id = $2 RETURNING {COLUMNS}"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        push_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn count_by(&self, collection: &str, field: &str) -> StoreResult<Vec<KeyCount>> {
        let rows = sqlx::query(
            "SELECT content -> $2 AS key, COUNT(*) AS count FROM documents \
             WHERE collection = $1 GROUP BY 1 ORDER BY MIN(seq)",
        )
        .bind(collection)
        .bind(field)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let key: Option<Json<Value>> = row.try_get("key")?;
                let count: i64 = row.try_get("count")?;
                Ok(KeyCount {
                    key: key.map_or(Value::Null, |k| k.0),
                    count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn ensure_unique(&self, collection: &str, field: &str) -> StoreResult<()> {
        if !is_identifier(collection) || !is_identifier(field) {
            return Err(StoreError::Invalid(format!(
                "cannot index `{collection}.{field}`: not a plain identifier"
            )));
        }
        let ddl = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"uq_{collection}{INDEX_FIELD_SEPARATOR}{field}\" \
             ON documents ((content ->> '{field}')) WHERE collection = '{collection}'"
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        tracing::debug!(collection, field, "unique key index ensured");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifiers_for_ddl() {
        assert!(is_identifier("contents"));
        assert!(is_identifier("sectionType"));
        assert!(!is_identifier("a__b"));
        assert!(!is_identifier("x'; DROP TABLE documents; --"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn filter_compiles_to_bound_jsonb_predicates() {
        let mut qb = select_from("enquiries");
        let filter = Filter::new().eq("status", json!("new")).search(&["name", "email"], "ra");
        push_filter(&mut qb, &filter);
        push_sort(&mut qb, &Sort::asc("order"));
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT seq, id, collection, content, created_at, updated_at FROM documents WHERE collection = $1"));
        assert!(sql.contains("AND content -> $2 = $3"));
        assert!(sql.contains("AND (content ->> $4 ~* $5 OR content ->> $6 ~* $7)"));
        assert!(sql.ends_with("ORDER BY NULLIF(content -> $8, 'null'::jsonb) ASC NULLS LAST, seq ASC"));
    }

    #[test]
    fn empty_search_field_list_matches_nothing() {
        let mut qb = select_from("news");
        push_filter(&mut qb, &Filter::new().matches_any(&[], "x"));
        assert!(qb.sql().ends_with("AND FALSE"));
    }
}
