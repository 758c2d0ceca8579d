//! # Realtime Fan-out
//!
//! Publish/subscribe bus behind the `/ws` endpoint. The connection registry
//! is an explicit service owned by [`crate::server::AppState`] and handed to
//! handlers by reference; there is no global singleton.
//!
//! Delivery guarantees match the wire contract: per-connection ordered,
//! at-most-once, no backlog on reconnect. Publishing is unconditionally
//! best-effort — a subscriber that went away is pruned, never retried, and
//! an empty room is not an error.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Room joined by office dashboards; entity-scoped events are mirrored here
/// so a dispatcher sees everything without joining each entity room.
pub const DISPATCH_ROOM: &str = "dispatch";

/// A named server→client event carrying the full affected entity (or just
/// the id for deletes).
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub event: String,
    pub payload: JsonValue,
}

impl Event {
    pub fn new(event: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    pub fn intervention_created(payload: JsonValue) -> Self {
        Self::new("intervention:created", payload)
    }

    pub fn intervention_updated(payload: JsonValue) -> Self {
        Self::new("intervention:updated", payload)
    }

    pub fn intervention_deleted(id: Uuid) -> Self {
        Self::new("intervention:deleted", serde_json::json!(id))
    }

    pub fn devis_updated(payload: JsonValue) -> Self {
        Self::new("devis:updated", payload)
    }

    pub fn tech_position_update(payload: JsonValue) -> Self {
        Self::new("tech:positionUpdate", payload)
    }

    pub fn tech_status_update(payload: JsonValue) -> Self {
        Self::new("tech:statusUpdate", payload)
    }

    pub fn tech_pause_update(payload: JsonValue) -> Self {
        Self::new("tech:pauseUpdate", payload)
    }

    /// Serialized frame sent down the socket.
    pub fn to_frame(&self) -> String {
        serde_json::json!({ "event": self.event, "payload": self.payload }).to_string()
    }
}

/// Client→server messages on the realtime channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    Join { room: String },
    Leave { room: String },
    #[serde(rename = "tech:position")]
    TechPosition { payload: JsonValue },
}

#[derive(Default)]
struct HubInner {
    conns: HashMap<Uuid, mpsc::UnboundedSender<String>>,
    rooms: HashMap<String, HashSet<Uuid>>,
    memberships: HashMap<Uuid, HashSet<String>>,
}

impl HubInner {
    fn drop_conn(&mut self, id: Uuid) {
        self.conns.remove(&id);
        if let Some(rooms) = self.memberships.remove(&id) {
            for room in rooms {
                if let Some(members) = self.rooms.get_mut(&room) {
                    members.remove(&id);
                    if members.is_empty() {
                        self.rooms.remove(&room);
                    }
                }
            }
        }
    }
}

/// Connection registry and broadcast bus.
pub struct Hub {
    inner: Mutex<HubInner>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubInner::default()),
        }
    }

    /// Registers a new connection and returns its id plus the outbound
    /// frame stream the socket writer task drains.
    pub fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        inner.conns.insert(id, tx);
        metrics::gauge!("realtime_connections").set(inner.conns.len() as f64);
        (id, rx)
    }

    pub fn unregister(&self, id: Uuid) {
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        inner.drop_conn(id);
        metrics::gauge!("realtime_connections").set(inner.conns.len() as f64);
    }

    pub fn join(&self, id: Uuid, room: &str) {
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        if !inner.conns.contains_key(&id) {
            return;
        }
        inner.rooms.entry(room.to_string()).or_default().insert(id);
        inner
            .memberships
            .entry(id)
            .or_default()
            .insert(room.to_string());
    }

    pub fn leave(&self, id: Uuid, room: &str) {
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
        if let Some(rooms) = inner.memberships.get_mut(&id) {
            rooms.remove(room);
        }
    }

    /// Delivers to every connected client (tech:* events).
    pub fn broadcast(&self, event: &Event) {
        let frame = event.to_frame();
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        let targets: Vec<Uuid> = inner.conns.keys().copied().collect();
        Self::deliver(&mut inner, &targets, &frame);
        metrics::counter!("realtime_events_total", "event" => event.event.clone()).increment(1);
    }

    /// Delivers to the union of the given rooms' members, each connection at
    /// most once (entity-scoped events plus the dispatch mirror).
    pub fn publish_rooms(&self, rooms: &[&str], event: &Event) {
        let frame = event.to_frame();
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        let mut targets: HashSet<Uuid> = HashSet::new();
        for room in rooms {
            if let Some(members) = inner.rooms.get(*room) {
                targets.extend(members.iter().copied());
            }
        }
        let targets: Vec<Uuid> = targets.into_iter().collect();
        Self::deliver(&mut inner, &targets, &frame);
        metrics::counter!("realtime_events_total", "event" => event.event.clone()).increment(1);
    }

    fn deliver(inner: &mut HubInner, targets: &[Uuid], frame: &str) {
        let mut dead = Vec::new();
        for id in targets {
            if let Some(tx) = inner.conns.get(id)
                && tx.send(frame.to_string()).is_err()
            {
                dead.push(*id);
            }
        }
        // Receiver gone means the socket closed under us; silently drop.
        for id in dead {
            inner.drop_conn(id);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().expect("hub lock poisoned").conns.len()
    }

    pub fn room_size(&self, room: &str) -> usize {
        self.inner
            .lock()
            .expect("hub lock poisoned")
            .rooms
            .get(room)
            .map_or(0, HashSet::len)
    }
}
