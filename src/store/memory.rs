use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use super::{ObjectBody, ObjectHead, ObjectStore, PutOutcome};
use crate::error::{AssetError, AssetResult};
use crate::types::ByteStream;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
}

/// In-memory object store backend. Used by tests and by embedders that do
/// not wire an external store.
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Number of stored objects (test helper)
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    fn chunked_stream(data: Bytes) -> ByteStream {
        let stream = async_stream::stream! {
            let mut offset = 0;
            while offset < data.len() {
                let end = (offset + CHUNK_SIZE).min(data.len());
                yield Ok(data.slice(offset..end));
                offset = end;
            }
        };
        Box::pin(stream)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        size: u64,
        mut body: ByteStream,
    ) -> AssetResult<PutOutcome> {
        // Drain the body fully before anything becomes visible: the write
        // is atomic, a failed stream commits nothing.
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(AssetError::storage)?;
            buf.extend_from_slice(&chunk);
        }

        if buf.len() as u64 != size {
            return Err(AssetError::storage_msg(format!(
                "declared size {} but body yielded {} bytes",
                size,
                buf.len()
            )));
        }

        let data = buf.freeze();
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        debug!(bucket = %self.bucket, key, size, "object stored");

        Ok(PutOutcome { size_bytes: size })
    }

    async fn get(&self, key: &str) -> AssetResult<ObjectBody> {
        let object = self
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| AssetError::not_found(key))?;

        Ok(ObjectBody {
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
            stream: Self::chunked_stream(object.data),
        })
    }

    async fn get_range(&self, key: &str, offset: u64, length: u64) -> AssetResult<ObjectBody> {
        let object = self
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| AssetError::not_found(key))?;

        // Re-verify against the actual size: caller-declared sizes may be
        // stale.
        let total = object.data.len() as u64;
        let end = offset
            .checked_add(length)
            .ok_or_else(|| AssetError::invalid_range("offset + length overflows"))?;
        if end > total {
            return Err(AssetError::invalid_range(format!(
                "bytes [{}, {}) exceed object size {}",
                offset, end, total
            )));
        }

        let slice = object.data.slice(offset as usize..end as usize);
        Ok(ObjectBody {
            size_bytes: length,
            content_type: object.content_type.clone(),
            stream: Self::chunked_stream(slice),
        })
    }

    async fn stat(&self, key: &str) -> AssetResult<ObjectHead> {
        let objects = self.objects.read();
        let object = objects.get(key).ok_or_else(|| AssetError::not_found(key))?;
        Ok(ObjectHead {
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
        })
    }

    async fn delete(&self, key: &str) -> AssetResult<()> {
        let removed = self.objects.write().remove(key).is_some();
        debug!(bucket = %self.bucket, key, removed, "object delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(data: &'static [u8]) -> ByteStream {
        Box::pin(futures::stream::once(async move {
            Ok(Bytes::from_static(data))
        }))
    }

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryObjectStore::new("files");
        store
            .put("k", Some("text/plain"), 5, body(b"hello"))
            .await
            .unwrap();

        let got = store.get("k").await.unwrap();
        assert_eq!(got.size_bytes, 5);
        assert_eq!(got.content_type.as_deref(), Some("text/plain"));
        assert_eq!(collect(got.stream).await, b"hello");
    }

    #[tokio::test]
    async fn put_rejects_size_mismatch_without_committing() {
        let store = MemoryObjectStore::new("files");
        let err = store.put("k", None, 99, body(b"hello")).await.unwrap_err();
        assert!(matches!(err, AssetError::StorageUnavailable { .. }));
        assert!(matches!(
            store.get("k").await.unwrap_err(),
            AssetError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn get_range_reads_only_the_requested_window() {
        let store = MemoryObjectStore::new("files");
        let data: Vec<u8> = (0..=255).collect();
        let data_clone = data.clone();
        let stream: ByteStream = Box::pin(futures::stream::once(async move {
            Ok(Bytes::from(data_clone))
        }));
        store.put("k", None, 256, stream).await.unwrap();

        let got = store.get_range("k", 10, 20).await.unwrap();
        assert_eq!(got.size_bytes, 20);
        assert_eq!(collect(got.stream).await, &data[10..30]);
    }

    #[tokio::test]
    async fn get_range_reverifies_against_actual_size() {
        let store = MemoryObjectStore::new("files");
        store.put("k", None, 5, body(b"hello")).await.unwrap();
        let err = store.get_range("k", 3, 10).await.unwrap_err();
        assert!(matches!(err, AssetError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryObjectStore::new("files");
        store.put("k", None, 5, body(b"hello")).await.unwrap();
        store.delete("k").await.unwrap();
        // Deleting an already-absent key is not an error
        store.delete("k").await.unwrap();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn stat_reports_size_and_content_type() {
        let store = MemoryObjectStore::new("files");
        store
            .put("k", Some("video/mp4"), 5, body(b"hello"))
            .await
            .unwrap();
        let head = store.stat("k").await.unwrap();
        assert_eq!(head.size_bytes, 5);
        assert_eq!(head.content_type.as_deref(), Some("video/mp4"));
        assert!(matches!(
            store.stat("absent").await.unwrap_err(),
            AssetError::NotFound { .. }
        ));
    }
}
