//! Hairdresser and salon registration, availability, and salon validation.
//!
//! Hairdressers manage their own profile and salon. Administrators may act
//! on any record and are the only ones who validate salons.

use std::sync::Arc;

use salonbook_core::{Coordinate, HairdresserId, Money, SalonId, ServiceLocation, Timestamp, UserId};
use salonbook_state::{validate_name, validate_photos, Actor, ActorRole, Hairdresser, Salon};

use crate::context::OpContext;
use crate::error::BookingError;
use crate::repository::{BookingRepository, HairdresserPatch, SalonPatch};

/// Input to [`DirectoryService::register_hairdresser`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterHairdresserRequest {
    /// The backing user account.
    pub user_id: UserId,
    /// Base price quoted in candidate lists.
    pub base_price: Money,
    /// Current position, if known.
    pub location: Option<Coordinate>,
}

/// Input to [`DirectoryService::register_salon`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSalonRequest {
    /// The owning hairdresser.
    pub owner: HairdresserId,
    /// Display name.
    pub name: String,
    /// Address and coordinate.
    pub location: ServiceLocation,
    /// Photo URLs.
    pub photos: Vec<String>,
}

/// Input to [`DirectoryService::update_salon`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSalonRequest {
    /// New name.
    pub name: Option<String>,
    /// New location.
    pub location: Option<ServiceLocation>,
    /// Replacement photo list.
    pub photos: Option<Vec<String>>,
}

/// Directory operations over the shared repository.
#[derive(Clone)]
pub struct DirectoryService {
    repo: Arc<dyn BookingRepository>,
}

impl DirectoryService {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    /// Register a hairdresser profile.
    ///
    /// A hairdresser actor registers itself and the profile takes the
    /// actor's id. An admin registers on behalf of someone and a new id is
    /// minted.
    pub async fn register_hairdresser(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        req: RegisterHairdresserRequest,
    ) -> Result<Hairdresser, BookingError> {
        let mut hairdresser = Hairdresser::new(req.user_id, req.base_price, req.location, Timestamp::now());
        match actor.role {
            ActorRole::Admin => {}
            ActorRole::Hairdresser => hairdresser.id = HairdresserId::from_uuid(actor.id),
            role => {
                return Err(BookingError::Forbidden(format!(
                    "{role} may not register hairdressers"
                )))
            }
        }
        let stored = ctx.run(self.repo.insert_hairdresser(hairdresser)).await?;
        tracing::info!(hairdresser_id = %stored.id, actor = %actor, "hairdresser registered");
        Ok(stored)
    }

    pub async fn get_hairdresser(
        &self,
        ctx: &OpContext,
        id: HairdresserId,
    ) -> Result<Hairdresser, BookingError> {
        Ok(ctx.run(self.repo.get_hairdresser(id)).await?)
    }

    /// Toggle whether the hairdresser takes new home bookings.
    pub async fn set_availability(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: HairdresserId,
        available: bool,
    ) -> Result<Hairdresser, BookingError> {
        authorize_self(actor, id)?;
        let patch = HairdresserPatch {
            is_available: Some(available),
            ..Default::default()
        };
        let updated = ctx.run(self.repo.update_hairdresser(id, &patch)).await?;
        tracing::info!(hairdresser_id = %id, available, "availability changed");
        Ok(updated)
    }

    /// Replace or clear the hairdresser's reported position.
    pub async fn update_hairdresser_location(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: HairdresserId,
        location: Option<Coordinate>,
    ) -> Result<Hairdresser, BookingError> {
        authorize_self(actor, id)?;
        let patch = HairdresserPatch {
            location: Some(location),
            ..Default::default()
        };
        Ok(ctx.run(self.repo.update_hairdresser(id, &patch)).await?)
    }

    /// Register a salon. It stays out of candidate searches until an
    /// admin validates it.
    pub async fn register_salon(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        req: RegisterSalonRequest,
    ) -> Result<Salon, BookingError> {
        authorize_self(actor, req.owner)?;
        ctx.run(self.repo.get_hairdresser(req.owner)).await?;
        let salon = Salon::new(req.owner, req.name, req.location, req.photos, Timestamp::now())?;
        let stored = ctx.run(self.repo.insert_salon(salon)).await?;
        tracing::info!(salon_id = %stored.id, owner = %stored.owner, "salon registered");
        Ok(stored)
    }

    pub async fn get_salon(&self, ctx: &OpContext, id: SalonId) -> Result<Salon, BookingError> {
        Ok(ctx.run(self.repo.get_salon(id)).await?)
    }

    /// Edit a salon's name, location or photos.
    pub async fn update_salon(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: SalonId,
        req: UpdateSalonRequest,
    ) -> Result<Salon, BookingError> {
        let salon = ctx.run(self.repo.get_salon(id)).await?;
        authorize_self(actor, salon.owner)?;

        let mut patch = SalonPatch::at(Timestamp::now());
        patch.name = req.name.map(validate_name).transpose()?;
        if let Some(photos) = &req.photos {
            validate_photos(photos)?;
        }
        patch.photos = req.photos;
        patch.location = req.location;
        Ok(ctx.run(self.repo.update_salon(id, &patch)).await?)
    }

    /// Approve or withdraw a salon. Admin only.
    pub async fn set_salon_validation(
        &self,
        ctx: &OpContext,
        actor: &Actor,
        id: SalonId,
        validated: bool,
    ) -> Result<Salon, BookingError> {
        if actor.role != ActorRole::Admin {
            return Err(BookingError::Forbidden("only admins validate salons".into()));
        }
        let mut patch = SalonPatch::at(Timestamp::now());
        patch.validated = Some(validated);
        let salon = ctx.run(self.repo.update_salon(id, &patch)).await?;
        tracing::info!(salon_id = %id, validated, admin = %actor.id, "salon validation changed");
        Ok(salon)
    }
}

fn authorize_self(actor: &Actor, id: HairdresserId) -> Result<(), BookingError> {
    match actor.role {
        ActorRole::Admin => Ok(()),
        ActorRole::Hairdresser if actor.id == id.0 => Ok(()),
        _ => Err(BookingError::Forbidden(format!("{actor} may not manage {id}"))),
    }
}
