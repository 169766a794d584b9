use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use scout_core::error::{Error, Result};
use scout_core::traits::VectorStore;
use scout_core::types::{Document, SearchHit, SourceKind, VectorEntry};

use crate::schema::{build_document_schema, vector_dim};
use crate::table::{get_meta, open_db, quote, set_meta, table_exists, META_TABLE};

fn store_err(e: impl std::fmt::Display) -> Error { Error::Store(e.to_string()) }

/// LanceDB-backed dense store. The async client is driven by a runtime owned
/// by the store, so every call blocks until LanceDB finishes.
pub struct LanceVectorStore {
	runtime: tokio::runtime::Runtime,
	db: Connection,
	table_name: String,
	dim: i32,
}

impl LanceVectorStore {
	pub fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let dim = i32::try_from(dim).map_err(|_| Error::InvalidConfig(format!("embedding dimension {dim} too large")))?;
		std::fs::create_dir_all(db_path)?;
		let runtime = tokio::runtime::Runtime::new()?;
		let db = runtime.block_on(open_db(db_path.to_string_lossy().as_ref())).map_err(store_err)?;
		let store = Self { runtime, db, table_name: table_name.to_string(), dim };
		store.check_dim()?;
		tracing::info!(path = %db_path.display(), table = table_name, dim, "opened vector store");
		Ok(store)
	}

	fn meta_key(&self) -> String { format!("build_id:{}", self.table_name) }

	/// An existing table written by an embedder of another width cannot be queried.
	fn check_dim(&self) -> Result<()> {
		let existing = self.runtime.block_on(async {
			if !table_exists(&self.db, &self.table_name).await? { return Ok::<_, lancedb::Error>(None); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			Ok(vector_dim(&table.schema().await?))
		}).map_err(store_err)?;
		match existing {
			Some(d) if d != self.dim => Err(Error::Inconsistent(format!(
				"table '{}' stores {}-d vectors but the embedder produces {}-d vectors", self.table_name, d, self.dim
			))),
			_ => Ok(()),
		}
	}

	fn entries_to_record_batch(&self, entries: &[VectorEntry]) -> Result<RecordBatch> {
		let schema = build_document_schema(self.dim);
		let mut ids = Vec::new(); let mut contents = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
		for e in entries {
			if e.vector.len() != self.dim as usize {
				return Err(Error::Embedding(format!("dim mismatch for {}: got {} expected {}", e.id, e.vector.len(), self.dim)));
			}
			ids.push(e.id.clone()); contents.push(e.text.clone()); vectors.push(Some(e.vector.iter().map(|&x| Some(x)).collect()));
		}
		RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(contents)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.dim)),
		]).map_err(store_err)
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::Store(format!("column '{}' missing", name)))
}

impl VectorStore for LanceVectorStore {
	fn upsert(&self, entries: &[VectorEntry]) -> Result<()> {
		if entries.is_empty() { return Ok(()); }
		let record_batch = self.entries_to_record_batch(entries)?;
		self.runtime.block_on(async {
			let schema = record_batch.schema();
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
			if table_exists(&self.db, &self.table_name).await? {
				let table = self.db.open_table(&self.table_name).execute().await?;
				// last write wins per id
				let mut mi = table.merge_insert(&["id"]);
				mi.when_matched_update_all(None).when_not_matched_insert_all();
				mi.execute(reader).await?;
			} else {
				self.db.create_table(&self.table_name, reader).execute().await?;
			}
			Ok::<_, lancedb::Error>(())
		}).map_err(store_err)?;
		tracing::info!(table = %self.table_name, n = entries.len(), "upserted vector entries");
		Ok(())
	}

	fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		if query_vec.len() != self.dim as usize {
			return Err(Error::Embedding(format!("query dim {} does not match store dim {}", query_vec.len(), self.dim)));
		}
		let batches = self.runtime.block_on(async {
			if !table_exists(&self.db, &self.table_name).await? { return Ok::<_, lancedb::Error>(Vec::new()); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			let stream = table.vector_search(query_vec.to_vec())?.distance_type(DistanceType::Cosine).limit(k).execute().await?;
			stream.try_collect::<Vec<RecordBatch>>().await
		}).map_err(store_err)?;
		let mut hits = Vec::new();
		for batch in &batches {
			let ids = string_column(batch, "id")?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
			for i in 0..batch.num_rows() {
				let score = distances.map_or(0.0, |d| 1.0 - d.value(i));
				hits.push(SearchHit { id: ids.value(i).to_string(), score, source: SourceKind::Vector });
			}
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(k);
		Ok(hits)
	}

	fn fetch(&self, ids: &[String]) -> Result<Vec<Document>> {
		if ids.is_empty() { return Ok(Vec::new()); }
		let filter = format!("id IN ({})", ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(","));
		let batches = self.runtime.block_on(async {
			if !table_exists(&self.db, &self.table_name).await? { return Ok::<_, lancedb::Error>(Vec::new()); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			table.query().only_if(filter).execute().await?.try_collect::<Vec<RecordBatch>>().await
		}).map_err(store_err)?;
		let mut by_id = HashMap::new();
		for batch in &batches {
			let id_col = string_column(batch, "id")?;
			let content_col = string_column(batch, "content")?;
			for i in 0..batch.num_rows() {
				if id_col.is_null(i) { continue; }
				by_id.insert(id_col.value(i).to_string(), content_col.value(i).to_string());
			}
		}
		Ok(ids.iter().filter_map(|id| by_id.remove(id).map(|text| Document::new(id.clone(), text))).collect())
	}

	fn count(&self) -> Result<usize> {
		self.runtime.block_on(async {
			if !table_exists(&self.db, &self.table_name).await? { return Ok::<_, lancedb::Error>(0); }
			self.db.open_table(&self.table_name).execute().await?.count_rows(None).await
		}).map_err(store_err)
	}

	fn retain_only(&self, ids: &[String]) -> Result<usize> {
		let filter = if ids.is_empty() {
			"id IS NOT NULL".to_string()
		} else {
			format!("id NOT IN ({})", ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(","))
		};
		let removed = self.runtime.block_on(async {
			if !table_exists(&self.db, &self.table_name).await? { return Ok::<_, lancedb::Error>(0); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			let before = table.count_rows(None).await?;
			table.delete(&filter).await?;
			Ok(before.saturating_sub(table.count_rows(None).await?))
		}).map_err(store_err)?;
		tracing::debug!(table = %self.table_name, removed, "pruned vector entries");
		Ok(removed)
	}

	fn build_id(&self) -> Result<Option<String>> {
		self.runtime.block_on(get_meta(&self.db, META_TABLE, &self.meta_key())).map_err(store_err)
	}

	fn set_build_id(&self, build_id: &str) -> Result<()> {
		self.runtime.block_on(set_meta(&self.db, META_TABLE, &self.meta_key(), build_id)).map_err(store_err)
	}
}
