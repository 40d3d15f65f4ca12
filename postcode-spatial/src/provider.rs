//! Spatial store provider trait.
//!
//! Abstracts over embedded (in-process) and remote store access. The
//! resolver only talks to this trait, so it works identically with either
//! backend and can be tested against wrappers that delay or fail queries.
//!
//! # Design
//!
//! The provider trait mirrors the snapshot query methods but is async. The
//! embedded implementation wraps a snapshot and bounds concurrency with a
//! semaphore. Each query takes a slot, then runs on the blocking pool with
//! the slot moved into the task, so the caller's future stays cancellable
//! while the snapshot computes. A caller that gives up on a query (for
//! example on a deadline) gets control back at once; the abandoned task
//! finishes in the background and returns its slot when it does.
//!
//! # Publishing
//!
//! The embedded provider holds its snapshot behind a lock so a rebuilt store
//! can be published while the provider is shared as `Arc<dyn SpatialProvider>`.
//! Each query clones the current `Arc<SpatialSnapshot>` up front and runs to
//! completion against it.

use crate::error::{Result, SpatialError};
use crate::model::{Area, AreaId, Generation, NearestCandidate, Postcode};
use crate::snapshot::SpatialSnapshot;
use crate::validity::GenerationId;
use async_trait::async_trait;
use geo_types::Point;
use std::sync::{Arc, RwLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Spatial store provider trait.
#[async_trait]
pub trait SpatialProvider: Send + Sync {
    /// SRID the store keeps its coordinates in.
    fn canonical_srid(&self) -> i32;

    /// All generations, oldest first.
    async fn generations(&self) -> Result<Vec<Generation>>;

    /// Postcode by normalized code, whatever its validity.
    async fn postcode(&self, code: &str) -> Result<Option<Postcode>>;

    /// Area by id, whatever its validity.
    async fn area(&self, id: AreaId) -> Result<Option<Area>>;

    /// Areas whose boundary contains `point` (canonical SRID).
    async fn areas_containing(
        &self,
        point: Point<f64>,
        generation: GenerationId,
    ) -> Result<Vec<Area>>;

    /// Areas linked to a postcode through the membership relation.
    async fn areas_for_postcode(
        &self,
        code: &str,
        generation: GenerationId,
    ) -> Result<Vec<Area>>;

    /// Areas by id, in the order given.
    async fn areas_by_id(&self, ids: &[AreaId], generation: GenerationId) -> Result<Vec<Area>>;

    /// The `k` postcodes nearest to `point` by centroid distance.
    ///
    /// Returns candidates sorted by centroid distance (nearest first).
    async fn nearest_candidates(
        &self,
        point: Point<f64>,
        k: usize,
        generation: GenerationId,
    ) -> Result<Vec<NearestCandidate>>;

    /// Locations of postcodes starting with `prefix` whose code is exactly
    /// `code_len` characters.
    async fn postcode_locations(
        &self,
        prefix: &str,
        code_len: usize,
        generation: GenerationId,
    ) -> Result<Vec<Point<f64>>>;

    /// Any postcode linked to the area through the membership relation.
    async fn member_postcode(
        &self,
        area_id: AreaId,
        generation: GenerationId,
    ) -> Result<Option<Postcode>>;

    /// Postcodes located inside the area's boundary, at most `limit`.
    async fn postcodes_within_area(
        &self,
        area_id: AreaId,
        generation: GenerationId,
        limit: usize,
    ) -> Result<Vec<Postcode>>;
}

struct Published {
    snapshot: Arc<SpatialSnapshot>,
    epoch: u64,
}

/// Embedded spatial provider that wraps an in-process snapshot.
pub struct EmbeddedSpatialProvider {
    published: RwLock<Published>,
    slots: Arc<Semaphore>,
    max_slots: usize,
}

impl EmbeddedSpatialProvider {
    /// Create a new embedded provider.
    ///
    /// The number of query slots comes from the snapshot's configuration.
    pub fn new(snapshot: SpatialSnapshot) -> Self {
        let max_slots = snapshot.config().max_concurrent_queries;
        Self {
            published: RwLock::new(Published {
                snapshot: Arc::new(snapshot),
                epoch: 0,
            }),
            slots: Arc::new(Semaphore::new(max_slots)),
            max_slots,
        }
    }

    /// The snapshot queries currently run against.
    pub fn snapshot(&self) -> Result<Arc<SpatialSnapshot>> {
        self.published
            .read()
            .map(|guard| Arc::clone(&guard.snapshot))
            .map_err(|_| SpatialError::Internal("snapshot lock poisoned".into()))
    }

    /// Publish a rebuilt snapshot.
    ///
    /// Epochs must increase; a stale or repeated epoch is ignored and `false`
    /// returned. Queries already running keep the snapshot they started with.
    pub fn publish(&self, snapshot: SpatialSnapshot, epoch: u64) -> Result<bool> {
        let mut guard = self
            .published
            .write()
            .map_err(|_| SpatialError::Internal("snapshot lock poisoned".into()))?;
        if epoch <= guard.epoch {
            return Ok(false);
        }
        guard.snapshot = Arc::new(snapshot);
        guard.epoch = epoch;
        tracing::debug!(epoch, "Published spatial snapshot");
        Ok(true)
    }

    /// Wait for a free query slot.
    ///
    /// The slot is returned when the permit is dropped.
    pub async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| SpatialError::Internal("query slots closed".into()))
    }

    /// Number of query slots not currently held.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Total number of query slots.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    async fn run<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&SpatialSnapshot) -> T + Send + 'static,
        T: Send + 'static,
    {
        let slot = self.acquire_slot().await?;
        let snapshot = self.snapshot()?;
        tokio::task::spawn_blocking(move || {
            let result = query(&snapshot);
            drop(slot);
            result
        })
        .await
        .map_err(|e| SpatialError::Internal(format!("query task failed: {e}")))
    }
}

#[async_trait]
impl SpatialProvider for EmbeddedSpatialProvider {
    fn canonical_srid(&self) -> i32 {
        self.snapshot()
            .map(|s| s.config().canonical_srid)
            .unwrap_or(4326)
    }

    async fn generations(&self) -> Result<Vec<Generation>> {
        self.run(|s| s.generations().to_vec()).await
    }

    async fn postcode(&self, code: &str) -> Result<Option<Postcode>> {
        let code = code.to_string();
        self.run(move |s| s.postcode(&code).cloned()).await
    }

    async fn area(&self, id: AreaId) -> Result<Option<Area>> {
        self.run(move |s| s.area(id).cloned()).await
    }

    async fn areas_containing(
        &self,
        point: Point<f64>,
        generation: GenerationId,
    ) -> Result<Vec<Area>> {
        self.run(move |s| s.areas_containing(&point, generation))
            .await
    }

    async fn areas_for_postcode(
        &self,
        code: &str,
        generation: GenerationId,
    ) -> Result<Vec<Area>> {
        let code = code.to_string();
        self.run(move |s| s.areas_for_postcode(&code, generation))
            .await
    }

    async fn areas_by_id(&self, ids: &[AreaId], generation: GenerationId) -> Result<Vec<Area>> {
        let ids = ids.to_vec();
        self.run(move |s| s.areas_by_id(&ids, generation)).await
    }

    async fn nearest_candidates(
        &self,
        point: Point<f64>,
        k: usize,
        generation: GenerationId,
    ) -> Result<Vec<NearestCandidate>> {
        self.run(move |s| s.nearest_candidates(&point, k, generation))
            .await
    }

    async fn postcode_locations(
        &self,
        prefix: &str,
        code_len: usize,
        generation: GenerationId,
    ) -> Result<Vec<Point<f64>>> {
        let prefix = prefix.to_string();
        self.run(move |s| s.postcode_locations(&prefix, code_len, generation))
            .await
    }

    async fn member_postcode(
        &self,
        area_id: AreaId,
        generation: GenerationId,
    ) -> Result<Option<Postcode>> {
        self.run(move |s| s.member_postcode(area_id, generation))
            .await
    }

    async fn postcodes_within_area(
        &self,
        area_id: AreaId,
        generation: GenerationId,
        limit: usize,
    ) -> Result<Vec<Postcode>> {
        self.run(move |s| s.postcodes_within_area(area_id, generation, limit))
            .await
    }
}
