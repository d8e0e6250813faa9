//! libsql-backed metadata store and collection registry
//!
//! Holds projects, datasets, chunks and collection records in one SQLite
//! database. Upserts use `ON CONFLICT` clauses; chunk batches ride in a
//! transaction; the unique constraint on `collection_records.dataset_id`
//! serializes concurrent registry upserts (a losing race is resolved by one
//! re-read).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ccx_domain::entities::{Chunk, Dataset, DatasetStatus, Project, VectorDbKind};
use ccx_domain::ports::{
    ClearReport, CollectionListing, CollectionRegistry, DatasetStats, MetadataStore,
    RegistryUpsert,
};
use ccx_domain::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS datasets (
    id         TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id),
    name       TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'active',
    tags       TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    UNIQUE (project_id, name)
);

CREATE TABLE IF NOT EXISTS chunks (
    id               TEXT PRIMARY KEY,
    dataset_id       TEXT NOT NULL REFERENCES datasets(id),
    source_path      TEXT NOT NULL,
    language         TEXT NOT NULL,
    start_line       INTEGER NOT NULL,
    end_line         INTEGER NOT NULL,
    start_byte       INTEGER NOT NULL,
    end_byte         INTEGER NOT NULL,
    content          TEXT NOT NULL,
    content_digest   TEXT NOT NULL,
    symbol_name      TEXT,
    symbol_kind      TEXT,
    symbol_signature TEXT,
    symbol_parent    TEXT,
    symbol_docstring TEXT,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_digest
    ON chunks (dataset_id, source_path, content_digest);

CREATE TABLE IF NOT EXISTS collection_records (
    id                  TEXT PRIMARY KEY,
    dataset_id          TEXT NOT NULL UNIQUE REFERENCES datasets(id),
    collection_name     TEXT NOT NULL UNIQUE,
    vector_db_kind      TEXT NOT NULL,
    embedding_dimension INTEGER NOT NULL,
    hybrid_enabled      INTEGER NOT NULL,
    point_count         INTEGER NOT NULL DEFAULT 0,
    last_indexed_at     TEXT
);
"#;

/// Metadata store and collection registry over libsql
pub struct LibsqlMetadataStore {
    conn: libsql::Connection,
    // kept alive for the lifetime of the store
    _db: libsql::Database,
}

impl LibsqlMetadataStore {
    /// Open (or create) a database at `path`; `:memory:` works for tests
    pub async fn open(path: &str) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| Error::database_with_source("failed to open metadata store", e))?;
        let conn = db
            .connect()
            .map_err(|e| Error::database_with_source("failed to connect to metadata store", e))?;

        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| Error::database_with_source("schema creation failed", e))?;
        }

        Ok(Self { conn, _db: db })
    }

    fn map_err(context: &str, e: libsql::Error) -> Error {
        let text = e.to_string();
        if text.contains("UNIQUE constraint failed") {
            Error::conflict(format!("{context}: {text}"))
        } else {
            Error::database(format!("{context}: {text}"))
        }
    }

    async fn select_project(&self, name: &str) -> Result<Option<Project>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, created_at FROM projects WHERE name = ?1",
                libsql::params![name],
            )
            .await
            .map_err(|e| Self::map_err("project lookup", e))?;
        match rows.next().await.map_err(|e| Self::map_err("project row", e))? {
            Some(row) => Ok(Some(Project {
                id: row.get(0).map_err(|e| Self::map_err("project id", e))?,
                name: row.get(1).map_err(|e| Self::map_err("project name", e))?,
                created_at: parse_datetime(
                    &row.get::<String>(2)
                        .map_err(|e| Self::map_err("project created_at", e))?,
                )?,
            })),
            None => Ok(None),
        }
    }

    async fn dataset_rows(&self, sql: &str, params: Vec<libsql::Value>) -> Result<Vec<Dataset>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| Self::map_err("dataset query", e))?;
        let mut datasets = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Self::map_err("dataset row", e))? {
            datasets.push(row_to_dataset(&row)?);
        }
        Ok(datasets)
    }
}

const DATASET_COLS: &str = "id, project_id, name, status, tags, created_at";

fn row_to_dataset(row: &libsql::Row) -> Result<Dataset> {
    let status: String = row
        .get(3)
        .map_err(|e| LibsqlMetadataStore::map_err("dataset status", e))?;
    let tags_json: String = row
        .get(4)
        .map_err(|e| LibsqlMetadataStore::map_err("dataset tags", e))?;
    Ok(Dataset {
        id: row
            .get(0)
            .map_err(|e| LibsqlMetadataStore::map_err("dataset id", e))?,
        project_id: row
            .get(1)
            .map_err(|e| LibsqlMetadataStore::map_err("dataset project_id", e))?,
        name: row
            .get(2)
            .map_err(|e| LibsqlMetadataStore::map_err("dataset name", e))?,
        status: if status == "archived" {
            DatasetStatus::Archived
        } else {
            DatasetStatus::Active
        },
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        created_at: parse_datetime(
            &row.get::<String>(5)
                .map_err(|e| LibsqlMetadataStore::map_err("dataset created_at", e))?,
        )?,
    })
}

/// Parse RFC 3339 or SQLite's default datetime format
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::database(format!("failed to parse datetime '{s}': {e}")))
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    match s {
        Some(s) if !s.is_empty() => parse_datetime(&s).map(Some),
        _ => Ok(None),
    }
}

#[async_trait]
impl MetadataStore for LibsqlMetadataStore {
    async fn ensure_project(&self, name: &str) -> Result<Project> {
        self.conn
            .execute(
                "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO NOTHING",
                libsql::params![
                    uuid::Uuid::new_v4().to_string(),
                    name,
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .map_err(|e| Self::map_err("project insert", e))?;
        self.select_project(name)
            .await?
            .ok_or_else(|| Error::database(format!("project {name} vanished after upsert")))
    }

    async fn get_project(&self, name: &str) -> Result<Option<Project>> {
        self.select_project(name).await
    }

    async fn ensure_dataset(
        &self,
        project_id: &str,
        name: &str,
        tags: &HashMap<String, String>,
    ) -> Result<Dataset> {
        self.conn
            .execute(
                "INSERT INTO datasets (id, project_id, name, status, tags, created_at)
                 VALUES (?1, ?2, ?3, 'active', ?4, ?5)
                 ON CONFLICT(project_id, name) DO NOTHING",
                libsql::params![
                    uuid::Uuid::new_v4().to_string(),
                    project_id,
                    name,
                    serde_json::to_string(tags)?,
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .map_err(|e| Self::map_err("dataset insert", e))?;

        let mut dataset = self
            .get_dataset(project_id, name)
            .await?
            .ok_or_else(|| Error::database(format!("dataset {name} vanished after upsert")))?;

        // Merge tags into a pre-existing row.
        if !tags.is_empty() {
            let mut merged = dataset.tags.clone();
            for (key, value) in tags {
                merged.insert(key.clone(), value.clone());
            }
            if merged != dataset.tags {
                self.conn
                    .execute(
                        "UPDATE datasets SET tags = ?1 WHERE id = ?2",
                        libsql::params![serde_json::to_string(&merged)?, dataset.id.clone()],
                    )
                    .await
                    .map_err(|e| Self::map_err("dataset tag merge", e))?;
                dataset.tags = merged;
            }
        }
        Ok(dataset)
    }

    async fn get_dataset(&self, project_id: &str, name: &str) -> Result<Option<Dataset>> {
        let sql = format!(
            "SELECT {DATASET_COLS} FROM datasets WHERE project_id = ?1 AND name = ?2"
        );
        Ok(self
            .dataset_rows(
                &sql,
                vec![
                    libsql::Value::Text(project_id.to_string()),
                    libsql::Value::Text(name.to_string()),
                ],
            )
            .await?
            .into_iter()
            .next())
    }

    async fn list_datasets(&self, project_id: &str) -> Result<Vec<Dataset>> {
        let sql = format!(
            "SELECT {DATASET_COLS} FROM datasets
             WHERE project_id = ?1 AND status = 'active' ORDER BY name"
        );
        self.dataset_rows(&sql, vec![libsql::Value::Text(project_id.to_string())])
            .await
    }

    async fn find_datasets_like(&self, project_id: &str, pattern: &str) -> Result<Vec<Dataset>> {
        let sql = format!(
            "SELECT {DATASET_COLS} FROM datasets
             WHERE project_id = ?1 AND status = 'active' AND name LIKE ?2 ESCAPE '\\'
             ORDER BY name"
        );
        self.dataset_rows(
            &sql,
            vec![
                libsql::Value::Text(project_id.to_string()),
                libsql::Value::Text(pattern.to_string()),
            ],
        )
        .await
    }

    async fn find_datasets_by_tag(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
    ) -> Result<Vec<Dataset>> {
        // Tags live in a JSON column; match on the serialized pair. The tag
        // vocabulary is small and conventional, so a LIKE probe is enough.
        let pair = format!(
            "{}:{}",
            serde_json::to_string(key)?,
            serde_json::to_string(value)?
        );
        let probe = format!("%{}%", pair.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            "SELECT {DATASET_COLS} FROM datasets
             WHERE project_id = ?1 AND status = 'active' AND tags LIKE ?2 ESCAPE '\\'
             ORDER BY name"
        );
        self.dataset_rows(
            &sql,
            vec![
                libsql::Value::Text(project_id.to_string()),
                libsql::Value::Text(probe),
            ],
        )
        .await
    }

    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| Self::map_err("chunk transaction begin", e))?;
        for chunk in chunks {
            tx.execute(
                "INSERT INTO chunks (id, dataset_id, source_path, language, start_line,
                                     end_line, start_byte, end_byte, content, content_digest,
                                     symbol_name, symbol_kind, symbol_signature, symbol_parent,
                                     symbol_docstring, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                 ON CONFLICT(id) DO UPDATE SET
                     content = excluded.content,
                     content_digest = excluded.content_digest,
                     start_line = excluded.start_line,
                     end_line = excluded.end_line,
                     symbol_name = excluded.symbol_name,
                     symbol_kind = excluded.symbol_kind,
                     symbol_signature = excluded.symbol_signature,
                     symbol_parent = excluded.symbol_parent,
                     symbol_docstring = excluded.symbol_docstring",
                libsql::params![
                    chunk.id.clone(),
                    chunk.dataset_id.clone(),
                    chunk.source_path.clone(),
                    chunk.language.clone(),
                    i64::from(chunk.start_line),
                    i64::from(chunk.end_line),
                    chunk.start_byte as i64,
                    chunk.end_byte as i64,
                    chunk.content.clone(),
                    chunk.content_digest.clone(),
                    chunk.symbol.name.clone(),
                    chunk.symbol.kind.map(|k| k.as_str().to_string()),
                    chunk.symbol.signature.clone(),
                    chunk.symbol.parent.clone(),
                    chunk.symbol.docstring.clone(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .map_err(|e| Self::map_err("chunk upsert", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| Self::map_err("chunk transaction commit", e))
    }

    async fn chunk_exists(
        &self,
        dataset_id: &str,
        source_path: &str,
        content_digest: &str,
    ) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM chunks
                 WHERE dataset_id = ?1 AND source_path = ?2 AND content_digest = ?3
                 LIMIT 1",
                libsql::params![dataset_id, source_path, content_digest],
            )
            .await
            .map_err(|e| Self::map_err("chunk existence probe", e))?;
        Ok(rows
            .next()
            .await
            .map_err(|e| Self::map_err("chunk existence row", e))?
            .is_some())
    }

    async fn dataset_stats(&self, dataset_id: &str) -> Result<DatasetStats> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*), COUNT(DISTINCT source_path) FROM chunks WHERE dataset_id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("chunk stats", e))?;
        let (chunk_count, file_count) = match rows
            .next()
            .await
            .map_err(|e| Self::map_err("chunk stats row", e))?
        {
            Some(row) => (
                row.get::<i64>(0).unwrap_or(0) as u64,
                row.get::<i64>(1).unwrap_or(0) as u64,
            ),
            None => (0, 0),
        };

        let mut rows = self
            .conn
            .query(
                "SELECT point_count, last_indexed_at FROM collection_records WHERE dataset_id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("collection stats", e))?;
        let (point_count, last_indexed_at) = match rows
            .next()
            .await
            .map_err(|e| Self::map_err("collection stats row", e))?
        {
            Some(row) => (
                row.get::<i64>(0).unwrap_or(0) as u64,
                parse_optional_datetime(row.get::<Option<String>>(1).unwrap_or(None))?,
            ),
            None => (0, None),
        };

        Ok(DatasetStats {
            chunk_count,
            file_count,
            point_count,
            last_indexed_at,
        })
    }

    async fn count_for_clear(&self, dataset_id: &str) -> Result<ClearReport> {
        let stats = self.dataset_stats(dataset_id).await?;
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM collection_records WHERE dataset_id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("clear count", e))?;
        let collections = match rows
            .next()
            .await
            .map_err(|e| Self::map_err("clear count row", e))?
        {
            Some(row) => row.get::<i64>(0).unwrap_or(0) as u64,
            None => 0,
        };
        Ok(ClearReport {
            datasets: 1,
            chunks: stats.chunk_count,
            points: stats.point_count,
            collections,
        })
    }

    async fn delete_dataset(&self, dataset_id: &str) -> Result<ClearReport> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| Self::map_err("clear transaction begin", e))?;
        let chunks = tx
            .execute(
                "DELETE FROM chunks WHERE dataset_id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("chunk delete", e))?;
        let collections = tx
            .execute(
                "DELETE FROM collection_records WHERE dataset_id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("collection record delete", e))?;
        let datasets = tx
            .execute(
                "DELETE FROM datasets WHERE id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("dataset delete", e))?;
        tx.commit()
            .await
            .map_err(|e| Self::map_err("clear transaction commit", e))?;

        Ok(ClearReport {
            datasets: datasets as u64,
            chunks: chunks as u64,
            points: 0,
            collections: collections as u64,
        })
    }
}

#[async_trait]
impl CollectionRegistry for LibsqlMetadataStore {
    async fn get_or_create(
        &self,
        dataset_id: &str,
        collection_name: &str,
        vector_db_kind: VectorDbKind,
        embedding_dimension: usize,
        hybrid_enabled: bool,
    ) -> Result<RegistryUpsert> {
        // Fast path: record already exists.
        if let Some(id) = self.lookup_record_id(dataset_id).await? {
            return Ok(RegistryUpsert {
                collection_id: id,
                freshly_created: false,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let inserted = self
            .conn
            .execute(
                "INSERT INTO collection_records
                     (id, dataset_id, collection_name, vector_db_kind,
                      embedding_dimension, hybrid_enabled, point_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
                 ON CONFLICT(dataset_id) DO NOTHING",
                libsql::params![
                    id.clone(),
                    dataset_id,
                    collection_name,
                    vector_db_kind.as_str(),
                    embedding_dimension as i64,
                    i64::from(hybrid_enabled)
                ],
            )
            .await
            .map_err(|e| Self::map_err("registry upsert", e))?;

        if inserted > 0 {
            return Ok(RegistryUpsert {
                collection_id: id,
                freshly_created: true,
            });
        }

        // Lost a concurrent race: the conflicting writer's record is ours to
        // reuse (StoreConflict is retried exactly once this way).
        self.lookup_record_id(dataset_id)
            .await?
            .map(|id| RegistryUpsert {
                collection_id: id,
                freshly_created: false,
            })
            .ok_or_else(|| Error::conflict("registry record disappeared during upsert race"))
    }

    async fn update_metadata(
        &self,
        collection_id: &str,
        point_count: u64,
        last_indexed_at: DateTime<Utc>,
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE collection_records SET point_count = ?1, last_indexed_at = ?2 WHERE id = ?3",
                libsql::params![
                    point_count as i64,
                    last_indexed_at.to_rfc3339(),
                    collection_id
                ],
            )
            .await
            .map_err(|e| Self::map_err("registry metadata update", e))?;
        if updated == 0 {
            return Err(Error::not_found(format!("collection record {collection_id}")));
        }
        Ok(())
    }

    async fn resolve(&self, project_name: &str, dataset_name: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT cr.collection_name
                 FROM collection_records cr
                 JOIN datasets d ON cr.dataset_id = d.id
                 JOIN projects p ON d.project_id = p.id
                 WHERE p.name = ?1 AND d.name = ?2",
                libsql::params![project_name, dataset_name],
            )
            .await
            .map_err(|e| Self::map_err("registry resolve", e))?;
        match rows
            .next()
            .await
            .map_err(|e| Self::map_err("registry resolve row", e))?
        {
            Some(row) => Ok(Some(
                row.get(0).map_err(|e| Self::map_err("collection name", e))?,
            )),
            None => Ok(None),
        }
    }

    async fn list_for_project(&self, project_name: &str) -> Result<Vec<CollectionListing>> {
        let mut rows = self
            .conn
            .query(
                "SELECT d.name, cr.collection_name, cr.point_count, cr.last_indexed_at
                 FROM collection_records cr
                 JOIN datasets d ON cr.dataset_id = d.id
                 JOIN projects p ON d.project_id = p.id
                 WHERE p.name = ?1
                 ORDER BY d.name",
                libsql::params![project_name],
            )
            .await
            .map_err(|e| Self::map_err("registry listing", e))?;

        let mut listings = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Self::map_err("registry listing row", e))?
        {
            listings.push(CollectionListing {
                dataset_name: row.get(0).map_err(|e| Self::map_err("listing dataset", e))?,
                collection_name: row
                    .get(1)
                    .map_err(|e| Self::map_err("listing collection", e))?,
                point_count: row.get::<i64>(2).unwrap_or(0) as u64,
                last_indexed_at: parse_optional_datetime(
                    row.get::<Option<String>>(3).unwrap_or(None),
                )?,
            });
        }
        Ok(listings)
    }
}

impl LibsqlMetadataStore {
    async fn lookup_record_id(&self, dataset_id: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM collection_records WHERE dataset_id = ?1",
                libsql::params![dataset_id],
            )
            .await
            .map_err(|e| Self::map_err("registry lookup", e))?;
        match rows
            .next()
            .await
            .map_err(|e| Self::map_err("registry lookup row", e))?
        {
            Some(row) => Ok(Some(
                row.get(0).map_err(|e| Self::map_err("registry record id", e))?,
            )),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccx_domain::entities::SymbolInfo;

    async fn store() -> LibsqlMetadataStore {
        LibsqlMetadataStore::open(":memory:").await.unwrap()
    }

    fn chunk(dataset_id: &str, path: &str, content: &str) -> Chunk {
        let normalized = Chunk::normalize(content);
        let digest = Chunk::digest(&normalized);
        Chunk {
            id: Chunk::compute_id(dataset_id, path, 0, normalized.len(), &digest),
            dataset_id: dataset_id.to_string(),
            source_path: path.to_string(),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 1,
            start_byte: 0,
            end_byte: normalized.len(),
            content: normalized,
            content_digest: digest,
            symbol: SymbolInfo::default(),
        }
    }

    #[tokio::test]
    async fn project_and_dataset_upserts_are_idempotent() {
        let store = store().await;
        let p1 = store.ensure_project("acme").await.unwrap();
        let p2 = store.ensure_project("acme").await.unwrap();
        assert_eq!(p1.id, p2.id);

        let tags = HashMap::new();
        let d1 = store.ensure_dataset(&p1.id, "local", &tags).await.unwrap();
        let d2 = store.ensure_dataset(&p1.id, "local", &tags).await.unwrap();
        assert_eq!(d1.id, d2.id);
    }

    #[tokio::test]
    async fn tag_merge_preserves_existing_tags() {
        let store = store().await;
        let project = store.ensure_project("acme").await.unwrap();

        let mut tags = HashMap::new();
        tags.insert("src".to_string(), "docs".to_string());
        store.ensure_dataset(&project.id, "docs", &tags).await.unwrap();

        let mut more = HashMap::new();
        more.insert("env".to_string(), "dev".to_string());
        let merged = store.ensure_dataset(&project.id, "docs", &more).await.unwrap();
        assert_eq!(merged.tags.get("src").map(String::as_str), Some("docs"));
        assert_eq!(merged.tags.get("env").map(String::as_str), Some("dev"));
    }

    #[tokio::test]
    async fn like_patterns_and_tag_lookup_expand_datasets() {
        let store = store().await;
        let project = store.ensure_project("acme").await.unwrap();
        let mut tags = HashMap::new();
        tags.insert("env".to_string(), "dev".to_string());
        store.ensure_dataset(&project.id, "github-main", &tags).await.unwrap();
        store
            .ensure_dataset(&project.id, "docs", &HashMap::new())
            .await
            .unwrap();

        let like = store
            .find_datasets_like(&project.id, "github-%")
            .await
            .unwrap();
        assert_eq!(like.len(), 1);
        assert_eq!(like[0].name, "github-main");

        let tagged = store
            .find_datasets_by_tag(&project.id, "env", "dev")
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].name, "github-main");
    }

    #[tokio::test]
    async fn chunk_upsert_and_digest_probe() {
        let store = store().await;
        let project = store.ensure_project("acme").await.unwrap();
        let dataset = store
            .ensure_dataset(&project.id, "local", &HashMap::new())
            .await
            .unwrap();

        let c = chunk(&dataset.id, "src/main.rs", "fn main() {}\n");
        store.upsert_chunks(&[c.clone()]).await.unwrap();
        // same id twice stays one row
        store.upsert_chunks(&[c.clone()]).await.unwrap();

        assert!(store
            .chunk_exists(&dataset.id, "src/main.rs", &c.content_digest)
            .await
            .unwrap());
        assert!(!store
            .chunk_exists(&dataset.id, "src/main.rs", "other-digest")
            .await
            .unwrap());

        let stats = store.dataset_stats(&dataset.id).await.unwrap();
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.file_count, 1);
    }

    #[tokio::test]
    async fn registry_get_or_create_is_single_winner() {
        let store = store().await;
        let project = store.ensure_project("acme").await.unwrap();
        let dataset = store
            .ensure_dataset(&project.id, "local", &HashMap::new())
            .await
            .unwrap();

        let first = store
            .get_or_create(&dataset.id, "project_acme_dataset_local", VectorDbKind::Primary, 64, false)
            .await
            .unwrap();
        assert!(first.freshly_created);

        let second = store
            .get_or_create(&dataset.id, "project_acme_dataset_local", VectorDbKind::Primary, 64, false)
            .await
            .unwrap();
        assert!(!second.freshly_created);
        assert_eq!(first.collection_id, second.collection_id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_get_or_create_produces_exactly_one_record() {
        use std::sync::Arc;

        let store = Arc::new(LibsqlMetadataStore::open(":memory:").await.unwrap());
        let project = store.ensure_project("acme").await.unwrap();
        let dataset = store
            .ensure_dataset(&project.id, "local", &HashMap::new())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let dataset_id = dataset.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .get_or_create(
                        &dataset_id,
                        "project_acme_dataset_local",
                        VectorDbKind::Primary,
                        64,
                        false,
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        let mut fresh = 0;
        for handle in handles {
            let upsert = handle.await.unwrap();
            if upsert.freshly_created {
                fresh += 1;
            }
            ids.push(upsert.collection_id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(fresh, 1);
    }

    #[tokio::test]
    async fn resolve_finds_indexed_dataset() {
        let store = store().await;
        let project = store.ensure_project("acme").await.unwrap();
        let dataset = store
            .ensure_dataset(&project.id, "local", &HashMap::new())
            .await
            .unwrap();
        let upsert = store
            .get_or_create(&dataset.id, "project_acme_dataset_local", VectorDbKind::Primary, 64, false)
            .await
            .unwrap();
        store
            .update_metadata(&upsert.collection_id, 42, Utc::now())
            .await
            .unwrap();

        let resolved = store.resolve("acme", "local").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("project_acme_dataset_local"));
        assert_eq!(store.resolve("acme", "absent").await.unwrap(), None);

        let listings = store.list_for_project("acme").await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].point_count, 42);
    }

    #[tokio::test]
    async fn delete_dataset_removes_everything() {
        let store = store().await;
        let project = store.ensure_project("acme").await.unwrap();
        let dataset = store
            .ensure_dataset(&project.id, "local", &HashMap::new())
            .await
            .unwrap();
        store
            .upsert_chunks(&[chunk(&dataset.id, "a.rs", "fn a() {}")])
            .await
            .unwrap();
        store
            .get_or_create(&dataset.id, "project_acme_dataset_local", VectorDbKind::Primary, 64, false)
            .await
            .unwrap();

        let report = store.delete_dataset(&dataset.id).await.unwrap();
        assert_eq!(report.datasets, 1);
        assert_eq!(report.chunks, 1);
        assert_eq!(report.collections, 1);

        assert_eq!(store.resolve("acme", "local").await.unwrap(), None);
        assert!(store.get_dataset(&project.id, "local").await.unwrap().is_none());
    }
}
