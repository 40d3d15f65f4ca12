//! Shared fixtures for postcode-resolver integration tests.

// Not every test crate uses every helper.
#![allow(dead_code)]

pub mod span_capture;

use async_trait::async_trait;
use geo_types::Point;
use postcode_resolver::{GbRules, PostcodeResolver, ResolverConfig};
use postcode_spatial::{
    Area, AreaId, EmbeddedSpatialProvider, Generation, GenerationId, NearestCandidate, Postcode,
    SpatialError, SpatialProvider, SpatialSnapshot, SpatialSnapshotBuilder, StoreConfig, Validity,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Fixture data
// =============================================================================

pub const SW1A1AA: (f64, f64) = (-0.141588, 51.501009);
pub const SW1A2BB: (f64, f64) = (-0.127625, 51.503390);

pub const COUNCIL: AreaId = 100;
pub const WARD: AreaId = 101;
pub const OLD_WARD: AreaId = 102;
pub const COUNTY: AreaId = 200;
pub const DIVISION: AreaId = 201;
pub const DISTRICT: AreaId = 300;
pub const DISTRICT_WARD: AreaId = 301;
pub const CONSTITUENCY: AreaId = 400;
pub const EURO_REGION: AreaId = 500;
pub const HOUSE_OF_COMMONS: AreaId = 900000;
pub const EUROPEAN_PARLIAMENT: AreaId = 900001;

/// Axis-aligned square around a lon/lat center, as WKT.
pub fn square(center: (f64, f64), half: f64) -> String {
    let (lng, lat) = center;
    format!(
        "POLYGON(({} {}, {} {}, {} {}, {} {}, {} {}))",
        lng - half,
        lat - half,
        lng + half,
        lat - half,
        lng + half,
        lat + half,
        lng - half,
        lat + half,
        lng - half,
        lat - half,
    )
}

fn point((lng, lat): (f64, f64)) -> Option<Point<f64>> {
    Some(Point::new(lng, lat))
}

/// Central London, two generations.
///
/// Generation 1 has ward 102, generation 2 replaces it with ward 101. The
/// ward, county division and district ward all contain SW1A 1AA.
pub fn london_snapshot(config: StoreConfig) -> SpatialSnapshot {
    let mut b = SpatialSnapshotBuilder::new(config);
    b.add_generation(Generation::new(1, true, "May 2022")).unwrap();
    b.add_generation(Generation::new(2, true, "May 2024")).unwrap();
    b.add_generation(Generation::new(3, false, "Next")).unwrap();

    let since = Validity::since(1);
    let areas: Vec<(Area, Option<String>)> = vec![
        (
            Area::new(COUNCIL, "Westminster City Council", "LBO", since).with_country("E"),
            Some(square(SW1A1AA, 0.08)),
        ),
        (
            Area::new(WARD, "St James's", "LBW", Validity::since(2))
                .with_parent(COUNCIL)
                .with_code("gss", "E05013806"),
            Some(square(SW1A1AA, 0.02)),
        ),
        (
            Area::new(OLD_WARD, "St James's (2002)", "LBW", Validity::between(1, 2))
                .with_parent(COUNCIL),
            Some(square(SW1A1AA, 0.02)),
        ),
        (
            Area::new(COUNTY, "Testshire County Council", "CTY", since),
            None,
        ),
        (
            Area::new(DIVISION, "Palace Division", "CED", since).with_parent(COUNTY),
            Some(square(SW1A1AA, 0.005)),
        ),
        (
            Area::new(DISTRICT, "Testshire District", "DIS", since),
            None,
        ),
        (
            Area::new(DISTRICT_WARD, "Palace Ward", "DIW", since).with_parent(DISTRICT),
            Some(square(SW1A1AA, 0.01)),
        ),
        (
            Area::new(CONSTITUENCY, "Cities of London and Westminster", "WMC", since),
            Some(square(SW1A1AA, 0.05)),
        ),
        (
            Area::new(EURO_REGION, "London", "EUR", since),
            Some(square((-0.1, 51.5), 1.0)),
        ),
        (
            Area::new(HOUSE_OF_COMMONS, "House of Commons", "WMP", since),
            None,
        ),
        (
            Area::new(EUROPEAN_PARLIAMENT, "European Parliament", "EUP", Validity::between(1, 2)),
            None,
        ),
    ];
    for (area, wkt) in areas {
        b.add_area(area, wkt.as_deref()).unwrap();
    }

    b.add_postcode(Postcode::new("SW1A1AA", point(SW1A1AA), since)).unwrap();
    b.add_postcode(Postcode::new("SW1A2BB", point(SW1A2BB), since)).unwrap();
    // One character too long for the SW1A group
    b.add_postcode(Postcode::new("SW1A 1AAX", point((-0.20, 51.52)), since))
        .unwrap();
    b.add_postcode(Postcode::new("SW1A9ZZ", None, since)).unwrap();
    b.add_postcode(Postcode::new(
        "SW1A0AA",
        point((-0.1247, 51.4998)),
        Validity::between(1, 2),
    ))
    .unwrap();
    b.add_postcode(Postcode::new("JE24WD", point((-2.1, 49.18)), since)).unwrap();

    b.link_postcode("SW1A9ZZ", WARD).unwrap();
    b.link_postcode("SW1A9ZZ", CONSTITUENCY).unwrap();
    b.link_postcode("SW1A0AA", OLD_WARD).unwrap();

    b.build().unwrap()
}

pub fn embedded(snapshot: SpatialSnapshot) -> Arc<EmbeddedSpatialProvider> {
    Arc::new(EmbeddedSpatialProvider::new(snapshot))
}

/// A resolver over the London fixture with GB rules.
pub fn london_resolver() -> PostcodeResolver {
    PostcodeResolver::new(
        embedded(london_snapshot(StoreConfig::default())),
        ResolverConfig::default(),
    )
    .with_rules(GbRules)
}

// =============================================================================
// Fault injection
// =============================================================================

/// Store operations, for choosing where to inject a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Generations,
    Postcode,
    Area,
    AreasContaining,
    AreasForPostcode,
    AreasById,
    NearestCandidates,
    PostcodeLocations,
    MemberPostcode,
    PostcodesWithinArea,
}

#[derive(Debug, Clone)]
pub enum Fault {
    /// Hold a query slot and sleep before answering.
    Delay(Duration),
    /// Fail with this error.
    Error(SpatialError),
}

/// Wraps the embedded provider and injects faults into chosen operations.
pub struct FaultyProvider {
    inner: Arc<EmbeddedSpatialProvider>,
    faults: HashMap<Op, Fault>,
}

impl FaultyProvider {
    pub fn new(inner: Arc<EmbeddedSpatialProvider>) -> Self {
        Self {
            inner,
            faults: HashMap::new(),
        }
    }

    pub fn with_fault(mut self, op: Op, fault: Fault) -> Self {
        self.faults.insert(op, fault);
        self
    }

    async fn inject(&self, op: Op) -> postcode_spatial::Result<()> {
        match self.faults.get(&op) {
            None => Ok(()),
            Some(Fault::Delay(delay)) => {
                let _slot = self.inner.acquire_slot().await?;
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Some(Fault::Error(err)) => Err(err.clone()),
        }
    }
}

#[async_trait]
impl SpatialProvider for FaultyProvider {
    fn canonical_srid(&self) -> i32 {
        self.inner.canonical_srid()
    }

    async fn generations(&self) -> postcode_spatial::Result<Vec<Generation>> {
        self.inject(Op::Generations).await?;
        self.inner.generations().await
    }

    async fn postcode(&self, code: &str) -> postcode_spatial::Result<Option<Postcode>> {
        self.inject(Op::Postcode).await?;
        self.inner.postcode(code).await
    }

    async fn area(&self, id: AreaId) -> postcode_spatial::Result<Option<Area>> {
        self.inject(Op::Area).await?;
        self.inner.area(id).await
    }

    async fn areas_containing(
        &self,
        point: Point<f64>,
        generation: GenerationId,
    ) -> postcode_spatial::Result<Vec<Area>> {
        self.inject(Op::AreasContaining).await?;
        self.inner.areas_containing(point, generation).await
    }

    async fn areas_for_postcode(
        &self,
        code: &str,
        generation: GenerationId,
    ) -> postcode_spatial::Result<Vec<Area>> {
        self.inject(Op::AreasForPostcode).await?;
        self.inner.areas_for_postcode(code, generation).await
    }

    async fn areas_by_id(
        &self,
        ids: &[AreaId],
        generation: GenerationId,
    ) -> postcode_spatial::Result<Vec<Area>> {
        self.inject(Op::AreasById).await?;
        self.inner.areas_by_id(ids, generation).await
    }

    async fn nearest_candidates(
        &self,
        point: Point<f64>,
        k: usize,
        generation: GenerationId,
    ) -> postcode_spatial::Result<Vec<NearestCandidate>> {
        self.inject(Op::NearestCandidates).await?;
        self.inner.nearest_candidates(point, k, generation).await
    }

    async fn postcode_locations(
        &self,
        prefix: &str,
        code_len: usize,
        generation: GenerationId,
    ) -> postcode_spatial::Result<Vec<Point<f64>>> {
        self.inject(Op::PostcodeLocations).await?;
        self.inner
            .postcode_locations(prefix, code_len, generation)
            .await
    }

    async fn member_postcode(
        &self,
        area_id: AreaId,
        generation: GenerationId,
    ) -> postcode_spatial::Result<Option<Postcode>> {
        self.inject(Op::MemberPostcode).await?;
        self.inner.member_postcode(area_id, generation).await
    }

    async fn postcodes_within_area(
        &self,
        area_id: AreaId,
        generation: GenerationId,
        limit: usize,
    ) -> postcode_spatial::Result<Vec<Postcode>> {
        self.inject(Op::PostcodesWithinArea).await?;
        self.inner
            .postcodes_within_area(area_id, generation, limit)
            .await
    }
}

/// A resolver over the London fixture whose store injects `fault` into `op`.
///
/// Returns the embedded store too, for checking its query slots.
pub fn faulty_london_resolver(
    op: Op,
    fault: Fault,
    query_timeout: Duration,
) -> (PostcodeResolver, Arc<EmbeddedSpatialProvider>) {
    let inner = embedded(london_snapshot(
        StoreConfig::default().with_max_concurrent_queries(4),
    ));
    let provider = FaultyProvider::new(Arc::clone(&inner)).with_fault(op, fault);
    let resolver = PostcodeResolver::new(
        Arc::new(provider),
        ResolverConfig::default().with_query_timeout(query_timeout),
    )
    .with_rules(GbRules);
    (resolver, inner)
}
