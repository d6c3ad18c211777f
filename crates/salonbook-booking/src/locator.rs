//! # Candidate Locator
//!
//! Proximity search. Salon requests rank validated salons; home requests
//! rank hairdressers that are available, not mid-job, and have a known
//! location. Hairdressers without a location are skipped rather than
//! assigned a made-up distance.
//!
//! Results are sorted by distance ascending, then rating descending, then
//! id, and truncated to the limit. An empty result is a normal outcome.
//! The locator only reads.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salonbook_core::{distance_km, Coordinate, HairdresserId, Money, SalonId};
use salonbook_state::ServiceType;

use crate::config::BookingConfig;
use crate::context::OpContext;
use crate::error::BookingError;
use crate::repository::BookingRepository;
use crate::telemetry;

/// What a candidate is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CandidateTarget {
    /// A salon, for salon bookings.
    Salon(SalonId),
    /// A hairdresser, for home bookings.
    Hairdresser(HairdresserId),
}

impl CandidateTarget {
    fn uuid(&self) -> Uuid {
        match self {
            Self::Salon(id) => id.0,
            Self::Hairdresser(id) => id.0,
        }
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The salon or hairdresser.
    pub target: CandidateTarget,
    /// Hairdresser who would do the job. For salons, the owner.
    pub hairdresser_id: HairdresserId,
    /// Salon name, for salon candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Great-circle distance from the search origin.
    pub distance_km: f64,
    /// Average rating of the hairdresser.
    pub rating: f64,
    /// Hairdresser's base price.
    pub price: Money,
}

/// Search parameters. `None` takes the configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    /// Where the client is, or where the service happens.
    pub origin: Coordinate,
    /// Salon or home.
    pub service_type: ServiceType,
    /// Maximum distance in km. Finite and non-negative.
    pub radius_km: Option<f64>,
    /// Maximum results.
    pub limit: Option<usize>,
}

/// Filter to `radius_km`, sort, and truncate to `limit`.
pub fn rank_candidates(mut candidates: Vec<Candidate>, radius_km: f64, limit: usize) -> Vec<Candidate> {
    candidates.retain(|c| c.distance_km <= radius_km);
    candidates.sort_by(compare);
    candidates.truncate(limit);
    candidates
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| b.rating.total_cmp(&a.rating))
        .then_with(|| a.target.uuid().cmp(&b.target.uuid()))
}

/// Proximity search over the repository's read side.
#[derive(Clone)]
pub struct CandidateLocator {
    repo: Arc<dyn BookingRepository>,
    config: Arc<BookingConfig>,
}

impl CandidateLocator {
    /// A locator reading from `repo`.
    pub fn new(repo: Arc<dyn BookingRepository>, config: Arc<BookingConfig>) -> Self {
        Self { repo, config }
    }

    /// Resolve defaults and check the radius and limit.
    pub fn resolve(&self, query: &CandidateQuery) -> Result<(f64, usize), BookingError> {
        let radius = query.radius_km.unwrap_or(self.config.default_radius_km);
        if !radius.is_finite() || radius < 0.0 {
            return Err(BookingError::Validation(format!(
                "radius_km must be a finite, non-negative number, got {radius}"
            )));
        }
        let limit = query.limit.unwrap_or(self.config.default_candidate_limit);
        if limit == 0 || limit > self.config.max_candidate_limit {
            return Err(BookingError::Validation(format!(
                "limit must be between 1 and {}, got {limit}",
                self.config.max_candidate_limit
            )));
        }
        Ok((radius, limit))
    }

    /// Ranked candidates within the radius. Empty when nobody qualifies.
    pub async fn find_candidates(
        &self,
        ctx: &OpContext,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, BookingError> {
        let (radius, limit) = self.resolve(query)?;
        telemetry::record_search(query.service_type);

        let candidates: Vec<Candidate> = match query.service_type {
            ServiceType::Salon => ctx
                .run(self.repo.list_validated_salons())
                .await?
                .into_iter()
                .map(|listing| Candidate {
                    target: CandidateTarget::Salon(listing.salon.id),
                    hairdresser_id: listing.salon.owner,
                    distance_km: distance_km(&query.origin, &listing.salon.location.coordinate()),
                    name: Some(listing.salon.name),
                    rating: listing.owner_rating,
                    price: listing.owner_base_price,
                })
                .collect(),
            ServiceType::Home => ctx
                .run(self.repo.list_available_hairdressers())
                .await?
                .into_iter()
                .filter_map(|h| {
                    let location = h.location?;
                    Some(Candidate {
                        target: CandidateTarget::Hairdresser(h.id),
                        hairdresser_id: h.id,
                        name: None,
                        distance_km: distance_km(&query.origin, &location),
                        rating: h.average_rating,
                        price: h.base_price,
                    })
                })
                .collect(),
        };

        let examined = candidates.len();
        let ranked = rank_candidates(candidates, radius, limit);
        tracing::debug!(
            service_type = %query.service_type,
            radius_km = radius,
            examined,
            returned = ranked.len(),
            "candidate search"
        );
        Ok(ranked)
    }
}
