use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resources the user reports as collected so far.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    collected: BTreeMap<String, u64>,
}

impl Inventory {
    pub fn new(collected: BTreeMap<String, u64>) -> Self {
        Self { collected }
    }

    pub fn collected(&self, resource: &str) -> u64 {
        self.collected.get(resource).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, resource: &str) -> u64 {
        let count = self.collected.entry(resource.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Returns `false` and leaves the count alone when it is already zero.
    pub fn decrement(&mut self, resource: &str) -> bool {
        match self.collected.get_mut(resource) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn set(&mut self, resource: &str, value: i64) -> u64 {
        let value = u64::try_from(value).unwrap_or(0);
        self.collected.insert(resource.to_string(), value);
        value
    }

    pub fn clear(&mut self, resource: &str) {
        self.collected.insert(resource.to_string(), 0);
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iron() -> String {
        "iron".to_string()
    }

    #[test]
    fn test_increment_from_nothing() {
        let mut inventory = Inventory::default();

        assert_eq!(inventory.collected(&iron()), 0);
        assert_eq!(inventory.increment(&iron()), 1);
        assert_eq!(inventory.increment(&iron()), 2);
        assert_eq!(inventory.collected(&iron()), 2);
    }

    #[test]
    fn test_decrement_stops_at_zero() {
        let mut inventory = Inventory::new(BTreeMap::from([(iron(), 1)]));

        assert!(inventory.decrement(&iron()));
        assert!(!inventory.decrement(&iron()));
        assert!(!inventory.decrement("copper"));
        assert_eq!(inventory.collected(&iron()), 0);
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_set_clamps_negative() {
        let mut inventory = Inventory::default();

        assert_eq!(inventory.set(&iron(), 42), 42);
        assert_eq!(inventory.set(&iron(), -3), 0);
        assert_eq!(inventory.collected(&iron()), 0);
    }

    #[test]
    fn test_clear() {
        let mut inventory = Inventory::new(BTreeMap::from([(iron(), 9)]));
        inventory.clear(&iron());

        assert_eq!(inventory.collected(&iron()), 0);
        assert_eq!(
            serde_json::to_value(&inventory).unwrap(),
            serde_json::json!({"collected": {"iron": 0}})
        );
    }
}
