//! Transport, matérialiseur et ressources factices partagés par les tests
//! d'intégration. Chaque action est consignée dans un journal commun pour
//! vérifier l'ordre exact des opérations.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, broadcast, broadcast::error::RecvError};
use ytccatalog::ClipSelection;
use ytcplayer::{
    ChannelId, ConnectionProvider, DestinationId, Error, PlayEvent, PlayEvents, PlayableResource,
    PlaybackEvent, PresenceSink, RequesterId, ResourceMaterializer, Result, VoiceConnection,
};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn count(log: &Log, prefix: &str) -> usize {
    entries(log).iter().filter(|e| e.starts_with(prefix)).count()
}

fn record(log: &Log, entry: String) {
    log.lock().unwrap().push(entry);
}

/// Ressource factice ; un nom contenant "error" provoque une erreur de
/// lecture, un nom contenant "panic" fait paniquer la connexion.
#[derive(Debug)]
pub struct MockResource {
    name: String,
    log: Log,
    fail_delete: bool,
}

impl MockResource {
    pub fn boxed(name: &str, log: &Log) -> Box<dyn PlayableResource> {
        Box::new(Self {
            name: name.to_string(),
            log: log.clone(),
            fail_delete: false,
        })
    }

    pub fn undeletable(name: &str, log: &Log) -> Box<dyn PlayableResource> {
        Box::new(Self {
            name: name.to_string(),
            log: log.clone(),
            fail_delete: true,
        })
    }
}

#[async_trait]
impl PlayableResource for MockResource {
    fn locator(&self) -> &str {
        &self.name
    }

    async fn delete(self: Box<Self>) -> Result<()> {
        record(&self.log, format!("delete:{}", self.name));
        if self.fail_delete {
            return Err(Error::Cleanup(format!("{} is locked", self.name)));
        }
        Ok(())
    }
}

pub struct MockConnection {
    channel: ChannelId,
    log: Log,
    gate: Option<Arc<Semaphore>>,
    teardown: Option<Arc<Semaphore>>,
}

#[async_trait]
impl VoiceConnection for MockConnection {
    fn channel(&self) -> &ChannelId {
        &self.channel
    }

    async fn play(&mut self, resource: &dyn PlayableResource) -> Result<PlayEvents> {
        record(
            &self.log,
            format!("play:{}@{}", resource.locator(), self.channel),
        );
        if resource.locator().contains("panic") {
            panic!("transport crashed on {}", resource.locator());
        }
        let terminal = if resource.locator().contains("error") {
            PlayEvent::Error("decoder crashed".to_string())
        } else {
            PlayEvent::Finished
        };
        let gate = self.gate.clone();
        let finish = stream::once(async move {
            // Bloque la fin de lecture jusqu'à ce que le test libère un jeton
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire_owned().await {
                    permit.forget();
                }
            }
            terminal
        });
        Ok(stream::iter(vec![
            PlayEvent::Started,
            PlayEvent::Progress {
                position: Duration::from_millis(500),
            },
        ])
        .chain(finish)
        .boxed())
    }

    async fn destroy(self: Box<Self>) {
        if let Some(teardown) = &self.teardown {
            record(&self.log, format!("destroy-begin:{}", self.channel));
            if let Ok(permit) = teardown.acquire().await {
                permit.forget();
            }
        }
        record(&self.log, format!("destroy:{}", self.channel));
    }
}

/// Fournisseur de connexions factice : positions des demandeurs modifiables
/// en cours de test, canaux refusant la connexion.
pub struct MockProvider {
    log: Log,
    positions: Mutex<HashMap<RequesterId, ChannelId>>,
    refused: Mutex<HashSet<ChannelId>>,
    gate: Option<Arc<Semaphore>>,
    teardown: Option<Arc<Semaphore>>,
}

impl MockProvider {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            positions: Mutex::new(HashMap::new()),
            refused: Mutex::new(HashSet::new()),
            gate: None,
            teardown: None,
        }
    }

    /// Chaque fin de lecture consomme un jeton de `gate`
    pub fn gated(log: &Log, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(log)
        }
    }

    /// Chaque `destroy()` consomme un jeton de `teardown` avant de se terminer
    pub fn with_slow_teardown(log: &Log, teardown: Arc<Semaphore>) -> Self {
        Self {
            teardown: Some(teardown),
            ..Self::new(log)
        }
    }

    pub fn place(&self, requester: &str, channel: &str) {
        self.positions
            .lock()
            .unwrap()
            .insert(requester.into(), channel.into());
    }

    pub fn refuse(&self, channel: &str) {
        self.refused.lock().unwrap().insert(channel.into());
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    async fn locate(
        &self,
        _destination: &DestinationId,
        requester: &RequesterId,
    ) -> Option<ChannelId> {
        self.positions.lock().unwrap().get(requester).cloned()
    }

    async fn connect(
        &self,
        _destination: &DestinationId,
        channel: &ChannelId,
    ) -> Result<Box<dyn VoiceConnection>> {
        record(&self.log, format!("connect:{}", channel));
        if self.refused.lock().unwrap().contains(channel) {
            return Err(Error::Connection(format!("{} is full", channel)));
        }
        Ok(Box::new(MockConnection {
            channel: channel.clone(),
            log: self.log.clone(),
            gate: self.gate.clone(),
            teardown: self.teardown.clone(),
        }))
    }
}

/// Matérialiseur factice : la ressource porte l'id de l'item
pub struct MockMaterializer {
    log: Log,
    broken: HashSet<String>,
    panicking: HashSet<String>,
}

impl MockMaterializer {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            broken: HashSet::new(),
            panicking: HashSet::new(),
        }
    }

    pub fn failing_on(log: &Log, ids: &[&str]) -> Self {
        Self {
            broken: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::new(log)
        }
    }

    pub fn panicking_on(log: &Log, ids: &[&str]) -> Self {
        Self {
            panicking: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl ResourceMaterializer for MockMaterializer {
    async fn materialize(&self, selection: &ClipSelection) -> Result<Box<dyn PlayableResource>> {
        let id = &selection.item.id;
        record(&self.log, format!("materialize:{}", id));
        if self.panicking.contains(id) {
            panic!("encoder crashed on {}", id);
        }
        if self.broken.contains(id) {
            return Err(Error::Materialization(format!("no source for {}", id)));
        }
        Ok(MockResource::boxed(id, &self.log))
    }
}

#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<String>>);

impl RecordingSink {
    pub fn history(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl PresenceSink for RecordingSink {
    fn set_status(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

/// Collecte les événements jusqu'au `DestinationIdle` de `destination`.
pub async fn wait_idle(
    rx: &mut broadcast::Receiver<PlaybackEvent>,
    destination: &DestinationId,
) -> Vec<PlaybackEvent> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(PlaybackEvent::DestinationIdle { destination: d }) if &d == destination => {
                    break;
                }
                Ok(event) => seen.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
    .await
    .expect("destination never went idle");
    seen
}

/// Attend qu'une entrée du journal satisfasse `predicate`.
pub async fn wait_for_log(log: &Log, predicate: impl Fn(&[String]) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if predicate(&entries(log)) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("log condition never met");
}
