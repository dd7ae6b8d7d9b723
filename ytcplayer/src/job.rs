//! PlaybackJob : une demande de lecture dans la file d'une destination

use crate::{PlayableResource, RequesterId};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use ytccatalog::ClipSelection;

/// Contenu à jouer : une sélection encore à matérialiser, ou une ressource
/// déjà prête.
#[derive(Debug)]
pub enum JobPayload {
    Selection(ClipSelection),
    Resource(Box<dyn PlayableResource>),
}

/// Un job de lecture.
///
/// Appartient à exactement une file de destination une fois enfilé ; il est
/// détruit après sa lecture et sa ressource transitoire est supprimée quel
/// que soit le résultat.
#[derive(Debug)]
pub struct PlaybackJob {
    pub id: Uuid,
    pub requester: RequesterId,
    /// Titre affiché par l'annonceur pendant la lecture
    pub title: String,
    pub payload: JobPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl PlaybackJob {
    pub fn from_selection(requester: RequesterId, selection: ClipSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester,
            title: selection.item.title.clone(),
            payload: JobPayload::Selection(selection),
            enqueued_at: Utc::now(),
        }
    }

    pub fn from_resource(
        requester: RequesterId,
        title: impl Into<String>,
        resource: Box<dyn PlayableResource>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester,
            title: title.into(),
            payload: JobPayload::Resource(resource),
            enqueued_at: Utc::now(),
        }
    }
}
