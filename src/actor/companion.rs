//! The companion's in-memory state and the commands that act on it.
//!
//! Only the task that owns a [`Companion`] mutates it. Queue and tracker
//! changes are written through to the cache straight away; catalog changes
//! arrive as [`RemoteSnapshot`]s from a background fetch.

use serde_json::{Value, json};

use crate::actor::error::CompanionError;
use crate::actor::inventory::Inventory;
use crate::actor::refresh::RemoteSnapshot;
use crate::api::model::Command;
use crate::blueprint::model::{Blueprints, Catalog, RawEntries, Resources, parse_entries};
use crate::blueprint::planner::{self, ListingEntry, Totals};
use crate::blueprint::queue::BuildQueue;
use crate::config::{APP_AUTHOR, APP_DESCRIPTION, APP_NAME};
use crate::store::{DataService, Source};

#[derive(Debug, Clone)]
pub struct Companion {
    catalog: Catalog,
    queue: BuildQueue,
    inventory: Inventory,
    store: DataService,
}

impl Companion {
    /// Builds state from whatever is already cached, without any network I/O.
    pub fn load_cached(store: DataService) -> Self {
        let blueprints: Blueprints = store
            .get_cached::<RawEntries>(Source::Blueprints)
            .map(|raw| parse_entries("blueprint", raw))
            .unwrap_or_default();
        let resources: Resources = store
            .get_cached::<RawEntries>(Source::Resources)
            .map(|raw| parse_entries("resource", raw))
            .unwrap_or_default();
        let queue = store.get_cached::<BuildQueue>(Source::Queue).unwrap_or_default();
        let inventory = store.get_cached::<Inventory>(Source::Tracker).unwrap_or_default();

        tracing::info!(
            "Loaded cache: {} blueprints, {} resources, {} queued, {} tracked",
            blueprints.len(),
            resources.len(),
            queue.len(),
            inventory.len()
        );

        Self {
            catalog: Catalog::new(blueprints, resources),
            queue,
            inventory,
            store,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn queue(&self) -> &BuildQueue {
        &self.queue
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn store(&self) -> &DataService {
        &self.store
    }

    /// Swaps in refreshed game data. Missing halves keep the current data;
    /// the queue and tracker are local and never replaced.
    pub fn apply_remote(&mut self, snapshot: &RemoteSnapshot) {
        if let Some(blueprints) = &snapshot.blueprints {
            self.catalog.blueprints = blueprints.clone();
        }
        if let Some(resources) = &snapshot.resources {
            self.catalog.resources = resources.clone();
        }
        tracing::info!(
            "Applied refreshed game data: {} blueprints, {} resources",
            self.catalog.blueprints.len(),
            self.catalog.resources.len()
        );
    }

    pub fn totals(&self) -> Totals {
        planner::compute_totals(&self.catalog, self.queue.iter())
    }

    pub fn execute(&mut self, command: Command) -> Result<Value, CompanionError> {
        tracing::debug!("Executing {}", command.method());

        let result = match command {
            Command::ListBlueprints => serde_json::to_value(planner::listing(&self.catalog))?,
            Command::BlueprintDetail { blueprint } => {
                let detail = planner::detail(&self.catalog, &blueprint)
                    .ok_or(CompanionError::UnknownBlueprint(blueprint))?;
                serde_json::to_value(detail)?
            }
            Command::ListQueue => self.queue_entries()?,
            Command::AddToQueue { blueprint } => {
                if self.catalog.blueprint(&blueprint).is_none() {
                    return Err(CompanionError::UnknownBlueprint(blueprint));
                }
                if self.queue.add(&blueprint) {
                    self.save_queue();
                }
                self.queue_entries()?
            }
            Command::RemoveFromQueue { blueprint } => {
                if self.queue.remove(&blueprint) {
                    self.save_queue();
                }
                self.queue_entries()?
            }
            Command::ResourceTotals => {
                let totals = self.totals();
                let rows = planner::resource_rows(&self.catalog, &totals, |id| {
                    self.inventory.collected(id)
                });
                serde_json::to_value(rows)?
            }
            Command::IncrementResource { resource } => {
                self.inventory.increment(&resource);
                self.save_tracker();
                self.tracked(&resource)
            }
            Command::DecrementResource { resource } => {
                if self.inventory.decrement(&resource) {
                    self.save_tracker();
                }
                self.tracked(&resource)
            }
            Command::SetResource { resource, value } => {
                self.inventory.set(&resource, value);
                self.save_tracker();
                self.tracked(&resource)
            }
            Command::ClearResource { resource } => {
                self.inventory.clear(&resource);
                self.save_tracker();
                self.tracked(&resource)
            }
            // The fetch runs outside the state lock; by the time this runs the
            // snapshot has been applied and only the new sizes are reported.
            Command::Refresh => json!({
                "blueprints": self.catalog.blueprints.len(),
                "resources": self.catalog.resources.len(),
            }),
            Command::About => json!({
                "name": APP_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "author": APP_AUTHOR,
                "description": APP_DESCRIPTION,
            }),
        };

        Ok(result)
    }

    fn queue_entries(&self) -> Result<Value, CompanionError> {
        let entries: Vec<ListingEntry> = self
            .queue
            .iter()
            .map(|id| ListingEntry {
                id: id.to_string(),
                name: self.catalog.blueprint_name(id),
            })
            .collect();
        Ok(serde_json::to_value(entries)?)
    }

    fn tracked(&self, resource: &str) -> Value {
        json!({
            "resource": resource,
            "collected": self.inventory.collected(resource),
        })
    }

    fn save_queue(&self) {
        if let Err(e) = self.store.save_json(Source::Queue, &self.queue) {
            tracing::warn!("Failed to persist build queue: {}", e);
        }
    }

    fn save_tracker(&self) {
        if let Err(e) = self.store.save_json(Source::Tracker, &self.inventory) {
            tracing::warn!("Failed to persist resource tracker: {}", e);
        }
    }
}
