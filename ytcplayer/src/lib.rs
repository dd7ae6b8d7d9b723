//! # ytcplayer - Lecture séquentielle de clips par destination
//!
//! Cette crate relie le sélecteur de clips de `ytccatalog` à un transport
//! vocal abstrait :
//!
//! - `ResourceMaterializer` / `FfmpegMaterializer` : découpe d'un clip en
//!   ressource jouable
//! - `ConnectionProvider` / `VoiceConnection` : contrat du transport vocal
//! - `PlaybackScheduler` : une file FIFO et une tâche de lecture par
//!   destination, une seule connexion active par destination
//! - `Announcer` : statut "en cours de lecture" avec retour automatique au
//!   statut par défaut
//! - `ClipPlayer` : point d'entrée des commandes et des récompenses
//!
//! # Architecture
//!
//! ```text
//! trigger ─▶ ClipPlayer::request ─▶ ClipSelector ─▶ PlaybackScheduler::enqueue
//!                                                         │
//!                     drain task (one per destination) ◀──┘
//!                       materialize ─▶ locate ─▶ connect/reuse
//!                       ─▶ announce ─▶ play ─▶ delete resource
//! ```
//!
//! Les erreurs d'un job (matérialisation, connexion, lecture) ne concernent
//! que ce job : elles sont journalisées et publiées en `PlaybackEvent::JobFailed`,
//! puis la file continue.

mod announcer;
mod error;
mod job;
mod materializer;
mod player;
mod redemption;
mod resource;
mod scheduler;
mod settings;
mod transport;

#[cfg(feature = "ytcconfig")]
mod config_ext;

pub use announcer::{Announcer, PresenceSink};
pub use error::{Error, JobErrorKind, Result};
pub use job::{JobPayload, PlaybackJob};
pub use materializer::{FfmpegMaterializer, ResourceMaterializer};
pub use player::{ClipPlayer, ClipTicket};
pub use redemption::{RedemptionMatcher, RedemptionRoute};
pub use resource::{PlayableResource, TempFileResource};
pub use scheduler::{DestinationPhase, PlaybackEvent, PlaybackScheduler};
pub use settings::PlayerSettings;
pub use transport::{
    ChannelId, ConnectionProvider, DestinationId, PlayEvent, PlayEvents, RequesterId,
    VoiceConnection,
};

#[cfg(feature = "ytcconfig")]
pub use config_ext::PlayerConfigExt;
