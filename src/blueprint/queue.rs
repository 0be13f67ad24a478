use serde::{Deserialize, Serialize};

/// Blueprints the user intends to build, in the order they were queued.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(from = "QueueDocument")]
pub struct BuildQueue {
    items: Vec<String>,
}

#[derive(Deserialize)]
struct QueueDocument {
    items: Vec<String>,
}

impl From<QueueDocument> for BuildQueue {
    fn from(document: QueueDocument) -> Self {
        BuildQueue::new(document.items)
    }
}

impl BuildQueue {
    pub fn new(items: Vec<String>) -> Self {
        let mut queue = Self::default();
        for item in items {
            queue.add(&item);
        }
        queue
    }

    /// Returns `false` when the blueprint is already queued.
    pub fn add(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.items.push(id.to_string());
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.items.iter().position(|item| item == id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates() {
        let mut queue = BuildQueue::default();

        assert!(queue.add("hull_plate"));
        assert!(queue.add("thruster"));
        assert!(!queue.add("hull_plate"));

        assert_eq!(queue.iter().collect::<Vec<_>>(), vec!["hull_plate", "thruster"]);
    }

    #[test]
    fn test_remove() {
        let mut queue = BuildQueue::new(vec!["a".to_string(), "b".to_string()]);

        assert!(queue.remove("a"));
        assert!(!queue.remove("a"));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains("b"));
    }

    #[test]
    fn test_persisted_shape() {
        let queue: BuildQueue = serde_json::from_str(r#"{"items": ["a", "b", "a"]}"#).unwrap();

        assert_eq!(
            serde_json::to_value(&queue).unwrap(),
            serde_json::json!({"items": ["a", "b"]})
        );
        assert!(serde_json::from_str::<BuildQueue>(r#"{"items": "a"}"#).is_err());
    }
}
