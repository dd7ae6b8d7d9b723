//! Point d'entrée des déclencheurs : commande de chat ou récompense.
//!
//! `ClipPlayer` tire un clip dans le catalogue courant puis le confie au
//! scheduler. Seules les erreurs de catalogue sont synchrones ; tout le reste
//! est rapporté par le flux d'événements du scheduler.

use crate::{
    DestinationId, Error, PlayableResource, PlaybackJob, PlaybackScheduler, PlayerSettings,
    RedemptionMatcher, RequesterId, Result,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use ytccatalog::{ClipSelection, ClipSelector};

/// Accusé de réception d'une demande acceptée
#[derive(Debug, Clone)]
pub struct ClipTicket {
    pub job_id: Uuid,
    pub selection: ClipSelection,
    /// Nombre de jobs en attente devant celui-ci
    pub position: usize,
}

impl ClipTicket {
    /// Lien vers la vidéo source au début du clip
    pub fn source_url(&self) -> String {
        self.selection.source_url()
    }
}

#[derive(Clone)]
pub struct ClipPlayer {
    selector: Arc<ClipSelector>,
    scheduler: PlaybackScheduler,
    settings: PlayerSettings,
}

impl ClipPlayer {
    pub fn new(
        selector: Arc<ClipSelector>,
        scheduler: PlaybackScheduler,
        settings: PlayerSettings,
    ) -> Self {
        Self {
            selector,
            scheduler,
            settings,
        }
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn selector(&self) -> &ClipSelector {
        &self.selector
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Tire un clip et l'enfile pour `destination`.
    ///
    /// `desired` vaut `settings.clip_secs` par défaut.
    ///
    /// # Errors
    ///
    /// * `Error::CatalogNotReady` si aucun catalogue n'a encore été publié
    /// * `Error::Catalog(EmptyCatalog)` si le catalogue est vide ; le job
    ///   n'entre alors dans aucune file
    pub fn request(
        &self,
        destination: DestinationId,
        requester: RequesterId,
        desired: Option<u64>,
    ) -> Result<ClipTicket> {
        if !self.selector.store().is_ready() {
            debug!(destination = %destination, "Request rejected, catalog not ready");
            return Err(Error::CatalogNotReady);
        }

        let desired = desired.unwrap_or(self.settings.clip_secs);
        let selection = self.selector.select(desired).inspect_err(|e| {
            warn!(destination = %destination, requester = %requester, "Clip request rejected: {}", e)
        })?;

        let job = PlaybackJob::from_selection(requester, selection.clone());
        let job_id = job.id;
        info!(
            destination = %destination,
            job = %job_id,
            item = %selection.item.id,
            start = selection.start_offset_secs,
            length = selection.actual_length_secs,
            "🎬 Clip requested"
        );
        let position = self.scheduler.enqueue(destination, job);

        Ok(ClipTicket {
            job_id,
            selection,
            position,
        })
    }

    /// Joue un clip si la récompense correspond au motif configuré.
    ///
    /// Retourne `Ok(None)` pour une récompense sans rapport.
    pub fn handle_redemption(
        &self,
        matcher: &RedemptionMatcher,
        reward_name: &str,
    ) -> Result<Option<ClipTicket>> {
        let Some(route) = matcher.route_for(reward_name) else {
            return Ok(None);
        };
        info!(reward = %reward_name, destination = %route.destination, "🎁 Redemption matched");
        self.request(
            route.destination.clone(),
            route.requester.clone(),
            Some(route.clip_secs),
        )
        .map(Some)
    }

    /// Enfile une ressource déjà prête (pas de tirage dans le catalogue).
    pub fn enqueue_resource(
        &self,
        destination: DestinationId,
        requester: RequesterId,
        title: impl Into<String>,
        resource: Box<dyn PlayableResource>,
    ) -> usize {
        let job = PlaybackJob::from_resource(requester, title, resource);
        self.scheduler.enqueue(destination, job)
    }

    /// Recopie le titre de la chaîne dans le statut par défaut de l'annonceur.
    pub fn sync_ambient(&self) {
        let (Some(announcer), Some(title)) = (
            self.scheduler.announcer(),
            self.selector.store().channel_title(),
        ) else {
            return;
        };
        announcer.set_ambient(title);
    }
}
