use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::SendError;

use crate::actor::model::{InternalMessage, lock};

pub const REQUEST_TOPIC: &str = "requests";

const TOPIC_CAPACITY: usize = 100;

#[derive(Clone, Debug)]
pub struct Topic {
    pub name: String,
    pub sender: tokio::sync::broadcast::Sender<InternalMessage>,
}

impl Topic {
    fn new(name: &str) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(TOPIC_CAPACITY);
        Topic {
            name: name.to_string(),
            sender,
        }
    }

    pub fn publish(&self, message: InternalMessage) -> Result<usize, SendError<InternalMessage>> {
        self.sender.send(message)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<InternalMessage> {
        self.sender.subscribe()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Broker {
    topics: Arc<Mutex<HashMap<String, Topic>>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(&self, name: &str) -> Topic {
        lock(&self.topics)
            .entry(name.to_string())
            .or_insert_with(|| Topic::new(name))
            .clone()
    }

    pub fn subscribe(&self, name: &str) -> tokio::sync::broadcast::Receiver<InternalMessage> {
        self.topic(name).subscribe()
    }

    pub fn publish(
        &self,
        name: &str,
        message: InternalMessage,
    ) -> Result<usize, SendError<InternalMessage>> {
        self.topic(name).publish(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_topics_are_shared_by_name() {
        let broker = Broker::new();
        let mut rx = broker.subscribe(REQUEST_TOPIC);

        let delivered = broker
            .clone()
            .publish(REQUEST_TOPIC, InternalMessage::TaskAdded)
            .unwrap();

        assert_eq!(delivered, 1);
        assert!(matches!(rx.recv().await, Ok(InternalMessage::TaskAdded)));
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = Broker::new();
        let mut other = broker.subscribe("other");

        let _requests = broker.subscribe(REQUEST_TOPIC);
        let _ = broker.publish(REQUEST_TOPIC, InternalMessage::Stop);

        assert!(other.try_recv().is_err());
    }
}
