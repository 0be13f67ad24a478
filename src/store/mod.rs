//! Cache-first access to the companion's JSON documents.
//!
//! Game data (blueprints, resources) comes from the CDN and is mirrored into
//! the cache directory; the build queue and tracker only ever live there.

pub mod error;
pub mod service;

pub use error::StoreError;
pub use service::{DataService, Remotes, Source};
