use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, CountPointsBuilder, CreateCollectionBuilder, Distance,
        PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Payload, Qdrant,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::qdrant_config::create_qdrant_client;
use super::vector_db::{ScoredChunk, VectorDBError, VectorStore};

/// Vector index kept in a Qdrant collection, cosine distance.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    created: OnceCell<()>,
}

impl QdrantVectorStore {
    /// Connects and drops any previous copy of `collection`, since the
    /// index is rebuilt from the documents on every start.
    pub async fn connect(url: &str, collection: &str) -> Result<Self, VectorDBError> {
        let client = create_qdrant_client(url).await?;

        let exists = client
            .collection_exists(collection)
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;
        if exists {
            log::info!("Dropping stale collection {}", collection);
            client
                .delete_collection(collection)
                .await
                .map_err(|e| VectorDBError::Operation(e.to_string()))?;
        }

        Ok(Self {
            client,
            collection: collection.to_string(),
            created: OnceCell::new(),
        })
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorDBError> {
        self.created
            .get_or_try_init(|| async {
                self.client
                    .create_collection(
                        CreateCollectionBuilder::new(self.collection.clone())
                            .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
                    )
                    .await
                    .map_err(|e| VectorDBError::Operation(e.to_string()))?;
                log::info!("Created collection {} ({} dimensions)", self.collection, dimension);
                Ok::<(), VectorDBError>(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn add(&self, texts: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Vec<String>, VectorDBError> {
        if texts.len() != embeddings.len() {
            return Err(VectorDBError::LengthMismatch {
                texts: texts.len(),
                embeddings: embeddings.len(),
            });
        }
        let Some(dimension) = embeddings.first().map(Vec::len) else {
            return Ok(Vec::new());
        };
        self.ensure_collection(dimension).await?;

        let mut ids = Vec::with_capacity(texts.len());
        let mut points = Vec::with_capacity(texts.len());
        for (text, vector) in texts.into_iter().zip(embeddings) {
            let id = Uuid::new_v4().to_string();
            let payload = Payload::try_from(serde_json::json!({ "text": text }))
                .map_err(|e| VectorDBError::Operation(e.to_string()))?;
            points.push(PointStruct::new(PointId::from(id.clone()), vector, payload));
            ids.push(id);
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        Ok(ids)
    }

    async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, VectorDBError> {
        if self.created.get().is_none() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.collection.clone(), query.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(PointIdOptions::Uuid(uuid)) => uuid,
                    Some(PointIdOptions::Num(num)) => num.to_string(),
                    None => String::new(),
                };
                let text = point.payload.get("text")?.as_str()?.to_string();
                Some(ScoredChunk { id, text, score: point.score })
            })
            .collect())
    }

    async fn len(&self) -> Result<usize, VectorDBError> {
        if self.created.get().is_none() {
            return Ok(0);
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(self.collection.clone()).exact(true))
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}
