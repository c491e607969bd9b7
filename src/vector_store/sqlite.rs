//! Per-video SQLite index files.
//!
//! Each processed video gets one `<video_id>.db` file holding its embedded
//! chunks, the raw transcript, and a small metadata table. Similarity is
//! computed in Rust over the (small) set of chunks.

use super::{rank, Document, SearchResult, VectorStore};
use crate::error::{Result, TubechatError};
use crate::youtube::Transcript;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// File extension of index files.
pub const INDEX_EXTENSION: &str = "db";

/// Bumped whenever the table layout changes; older files are rebuilt.
const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        video_id TEXT NOT NULL,
        content TEXT NOT NULL,
        chunk_order INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transcript (
        video_id TEXT PRIMARY KEY,
        transcript_json TEXT NOT NULL,
        duration_seconds REAL NOT NULL,
        fetched_at TEXT NOT NULL
    );
"#;

/// Path of the index file for `video_id` inside `dir`.
pub fn index_path(dir: &Path, video_id: &str) -> PathBuf {
    dir.join(format!("{}.{}", video_id, INDEX_EXTENSION))
}

/// SQLite-backed index for a single video.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteVectorStore {
    /// Write a new index file at `path`, replacing any existing one.
    ///
    /// The file is built under a temporary name and renamed into place, so a
    /// concurrent existence check never sees a partially written index.
    #[instrument(skip_all, fields(path = %path.display(), docs = documents.len()))]
    pub fn create(
        path: &Path,
        transcript: &Transcript,
        embedding_model: &str,
        documents: &[Document],
    ) -> Result<Self> {
        let dimensions = match documents.first() {
            Some(first) => first.embedding.len(),
            None => {
                return Err(TubechatError::VectorStore(format!(
                    "Refusing to write index for {} without documents",
                    transcript.video_id
                )))
            }
        };
        if documents.iter().any(|d| d.embedding.len() != dimensions) {
            return Err(TubechatError::VectorStore(
                "Documents have embeddings of different sizes".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension(format!(
            "{}.{}.tmp",
            INDEX_EXTENSION,
            uuid::Uuid::new_v4().simple()
        ));

        let written =
            Self::write_file(&tmp_path, transcript, embedding_model, dimensions, documents);
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        std::fs::rename(&tmp_path, path)?;
        info!("Wrote index for {} ({} chunks)", transcript.video_id, documents.len());

        Self::open(path)
    }

    fn write_file(
        path: &Path,
        transcript: &Transcript,
        embedding_model: &str,
        dimensions: usize,
        documents: &[Document],
    ) -> Result<()> {
        let dimensions = dimensions.to_string();
        let mut conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("video_id", transcript.video_id.as_str()),
            ("embedding_model", embedding_model),
            ("embedding_dimensions", dimensions.as_str()),
        ] {
            tx.execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        tx.execute(
            r#"
            INSERT OR REPLACE INTO transcript (video_id, transcript_json, duration_seconds, fetched_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                transcript.video_id,
                serde_json::to_string(transcript)?,
                transcript.duration_seconds(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        for doc in documents {
            insert_document(&tx, doc)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Open an existing index file and check that it is usable.
    ///
    /// Fails if the file is missing, is not a SQLite database, has an
    /// unexpected format version, or holds no documents.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'format_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if version.as_deref() != Some(FORMAT_VERSION) {
            return Err(TubechatError::VectorStore(format!(
                "Unsupported index format {:?} in {}",
                version,
                path.display()
            )));
        }

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        if count == 0 {
            return Err(TubechatError::VectorStore(format!(
                "Index {} contains no documents",
                path.display()
            )));
        }

        debug!("Opened index with {} documents", count);
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a metadata value.
    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Embedding model the stored vectors were produced with.
    pub fn embedding_model(&self) -> Result<Option<String>> {
        self.meta("embedding_model")
    }

    /// Length of the stored embedding vectors.
    pub fn embedding_dimensions(&self) -> Result<Option<usize>> {
        self.meta("embedding_dimensions")?
            .map(|v| {
                v.parse().map_err(|_| {
                    TubechatError::VectorStore(format!("Invalid embedding_dimensions {:?}", v))
                })
            })
            .transpose()
    }

    /// Retrieve the stored raw transcript.
    pub fn get_transcript(&self) -> Result<Option<Transcript>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row("SELECT transcript_json FROM transcript LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(TubechatError::from))
            .transpose()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubechatError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn load_documents(conn: &Connection, video_id: Option<&str>) -> Result<Vec<Document>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_id, content, chunk_order, embedding, indexed_at
            FROM documents
            WHERE ?1 IS NULL OR video_id = ?1
            ORDER BY chunk_order
            "#,
        )?;

        let rows = stmt.query_map(params![video_id], |row| {
            let id_str: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let indexed_at_str: String = row.get(5)?;

            Ok(Document {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                video_id: row.get(1)?,
                content: row.get(2)?,
                chunk_order: row.get(3)?,
                embedding: bytes_to_embedding(&embedding_bytes),
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let docs = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(docs)
    }
}

fn insert_document(conn: &Connection, doc: &Document) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO documents
        (id, video_id, content, chunk_order, embedding, indexed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            doc.id.to_string(),
            doc.video_id,
            doc.content,
            doc.chunk_order,
            embedding_to_bytes(&doc.embedding),
            doc.indexed_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Serialize embedding to little-endian bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from little-endian bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for doc in docs {
            insert_document(&tx, doc)?;
        }
        tx.commit()?;
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let docs = Self::load_documents(&conn, None)?;
        Ok(rank(query_embedding, docs, limit))
    }

    async fn get_by_video_id(&self, video_id: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        Self::load_documents(&conn, Some(video_id))
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::TranscriptSegment;

    fn transcript() -> Transcript {
        Transcript::new(
            "dQw4w9WgXcQ",
            vec![
                TranscriptSegment::new("never gonna give you up", 0.0, 2.0),
                TranscriptSegment::new("never gonna let you down", 2.0, 2.0),
            ],
        )
    }

    fn documents() -> Vec<Document> {
        vec![
            Document::new(
                "dQw4w9WgXcQ".to_string(),
                "never gonna give you up".to_string(),
                0,
                vec![1.0, 0.0, 0.0],
            ),
            Document::new(
                "dQw4w9WgXcQ".to_string(),
                "never gonna let you down".to_string(),
                1,
                vec![0.0, 1.0, 0.0],
            ),
        ]
    }

    #[tokio::test]
    async fn test_create_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), "dQw4w9WgXcQ");

        let store =
            SqliteVectorStore::create(&path, &transcript(), "text-embedding-3-small", &documents())
                .unwrap();
        assert_eq!(store.document_count().await.unwrap(), 2);
        drop(store);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let store = SqliteVectorStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        let results = store.search(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content, "never gonna let you down");
        assert!((results[0].score - 1.0).abs() < 0.001);

        assert_eq!(
            store.embedding_model().unwrap().as_deref(),
            Some("text-embedding-3-small")
        );
        assert_eq!(store.embedding_dimensions().unwrap(), Some(3));
        let stored = store.get_transcript().unwrap().unwrap();
        assert_eq!(stored.segments.len(), 2);

        let ordered = store.get_by_video_id("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(ordered[0].embedding, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), "dQw4w9WgXcQ");
        std::fs::write(&path, b"definitely not sqlite, just some bytes on disk").unwrap();

        assert!(SqliteVectorStore::open(&path).is_err());
    }

    #[test]
    fn test_open_rejects_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), "dQw4w9WgXcQ");
        SqliteVectorStore::write_file(&path, &transcript(), "text-embedding-3-small", 3, &[])
            .unwrap();

        assert!(SqliteVectorStore::open(&path).is_err());
    }

    #[test]
    fn test_create_without_documents_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), "dQw4w9WgXcQ");

        let result = SqliteVectorStore::create(&path, &transcript(), "text-embedding-3-small", &[]);
        assert!(matches!(result, Err(TubechatError::VectorStore(_))));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_rejects_mixed_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_path(dir.path(), "dQw4w9WgXcQ");
        let mut docs = documents();
        docs[1].embedding.push(0.5);

        assert!(
            SqliteVectorStore::create(&path, &transcript(), "text-embedding-3-small", &docs)
                .is_err()
        );
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SqliteVectorStore::open(&index_path(dir.path(), "dQw4w9WgXcQ")).is_err());
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25, -1.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&embedding)), embedding);
    }
}
