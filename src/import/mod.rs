//! Writing extracted documentation into a content store.

pub mod importer;
pub mod pacing;
pub mod policy;

pub use importer::{ContentImporter, EntityFailure, ImportReport, Importer};
pub use pacing::{FixedDelay, NoPacing, Pacer};
pub use policy::{validate_actor, ActorRef, Identity, IdentityLookup, ImportPolicy};
