//! Voice transport contracts.
//!
//! The scheduler never talks to a voice SDK directly. A [`ConnectionProvider`]
//! resolves where a requester currently is and opens [`VoiceConnection`]s;
//! a connection plays one resource at a time and reports progress as a
//! stream of [`PlayEvent`]s ending with `Finished` or `Error`.

use crate::{PlayableResource, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::time::Duration;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Playback target holding at most one live connection (e.g. a guild)
    DestinationId
);

string_id!(
    /// Channel inside a destination that a connection joins
    ChannelId
);

string_id!(
    /// Identity of whoever triggered a clip
    RequesterId
);

/// Event emitted by a connection while it plays a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayEvent {
    Started,
    Progress { position: Duration },
    Finished,
    Error(String),
}

/// Event stream returned by [`VoiceConnection::play`]
pub type PlayEvents = BoxStream<'static, PlayEvent>;

/// A live voice session joined to one channel.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Channel this connection is joined to
    fn channel(&self) -> &ChannelId;

    /// Starts playing `resource` and returns its event stream.
    async fn play(&mut self, resource: &dyn PlayableResource) -> Result<PlayEvents>;

    /// Leaves the channel and releases the session.
    async fn destroy(self: Box<Self>);
}

/// Opens voice connections and locates requesters.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Channel the requester currently sits in, if any.
    ///
    /// Called when the job reaches the head of the queue, not at enqueue
    /// time, so a requester who moved is followed.
    async fn locate(&self, destination: &DestinationId, requester: &RequesterId)
    -> Option<ChannelId>;

    async fn connect(
        &self,
        destination: &DestinationId,
        channel: &ChannelId,
    ) -> Result<Box<dyn VoiceConnection>>;
}
