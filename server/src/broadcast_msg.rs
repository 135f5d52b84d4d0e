use uuid::Uuid;

/// Sent from the console to every connection task.
#[derive(Debug, Clone)]
pub enum BroadcastMsg {
    Kick (Uuid),
    Announce (String),
    Shutdown,
}
