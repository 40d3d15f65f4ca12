//! Generation validity and generation-scoped filtering.
//!
//! Every area and postcode carries the half-open range of generations
//! `[start, end)` in which it exists. A record with no `end` is still live.
//! Queries always run against a single generation; records whose range does
//! not contain it are invisible, so a record retired in one generation never
//! leaks into queries for a later one.

use serde::{Deserialize, Serialize};

/// Dataset version identifier.
pub type GenerationId = u32;

/// Half-open generation range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validity {
    /// First generation the record is present in.
    #[serde(rename = "generation_start")]
    pub start: GenerationId,

    /// First generation the record is no longer present in.
    #[serde(rename = "generation_end")]
    pub end: Option<GenerationId>,
}

impl Validity {
    /// A record introduced in `start` and still live.
    pub fn since(start: GenerationId) -> Self {
        Self { start, end: None }
    }

    /// A record present from `start` up to but excluding `end`.
    pub fn between(start: GenerationId, end: GenerationId) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Check whether the record is visible at `generation`.
    pub fn contains(&self, generation: GenerationId) -> bool {
        generation >= self.start && self.end.is_none_or(|end| generation < end)
    }

    /// Check the range is non-empty.
    pub fn is_empty(&self) -> bool {
        self.end.is_some_and(|end| end <= self.start)
    }
}

/// Records that are scoped to a generation range.
pub trait Versioned {
    fn validity(&self) -> &Validity;

    fn visible_at(&self, generation: GenerationId) -> bool {
        self.validity().contains(generation)
    }
}

/// Iterator adapter that keeps only the records visible at one generation.
pub struct GenerationFilter<I> {
    inner: I,
    generation: GenerationId,
}

impl<I> GenerationFilter<I> {
    /// Create a new generation filter.
    pub fn new(inner: I, generation: GenerationId) -> Self {
        Self { inner, generation }
    }
}

impl<I, T> Iterator for GenerationFilter<I>
where
    I: Iterator<Item = T>,
    T: Versioned,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let generation = self.generation;
        self.inner.find(|item| item.visible_at(generation))
    }
}
