use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use wall_types::models::{Comment, Message};

/// A message with its comment thread attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageThread {
    pub message: Message,
    pub comments: Vec<Comment>,
}

/// Join comments onto their messages. Message order is kept as given
/// (newest first from the backend); comments stay oldest first. Comments
/// whose message is not in the list are dropped.
pub fn build_threads(messages: Vec<Message>, comments: Vec<Comment>) -> Vec<MessageThread> {
    let mut by_message: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_message.entry(comment.message_id).or_default().push(comment);
    }

    messages
        .into_iter()
        .map(|message| {
            let comments = by_message.remove(&message.id).unwrap_or_default();
            MessageThread { message, comments }
        })
        .collect()
}

/// Last fetched threads per wall. Mutations drop the affected wall's entry
/// so the next read goes back to the backend.
#[derive(Default)]
pub struct ThreadCache {
    walls: Mutex<HashMap<Uuid, Vec<MessageThread>>>,
}

impl ThreadCache {
    pub fn get(&self, wall_id: Uuid) -> Option<Vec<MessageThread>> {
        self.walls.lock().unwrap_or_else(|e| e.into_inner()).get(&wall_id).cloned()
    }

    pub fn put(&self, wall_id: Uuid, threads: Vec<MessageThread>) {
        self.walls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(wall_id, threads);
    }

    pub fn invalidate(&self, wall_id: Uuid) {
        self.walls.lock().unwrap_or_else(|e| e.into_inner()).remove(&wall_id);
    }
}
