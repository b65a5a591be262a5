//! Block mapping module
//!
//! Loads the declarative rule file that drives block extraction. The
//! mapping is an explicit value handed to the extraction engine, so tests
//! can build synthetic rule sets with [`MappingLoader::from_rules`].

mod loader;
mod types;

pub use loader::MappingLoader;
pub use types::{BlockRule, ComponentRule, ComponentTarget, ExtractionKind, HREF_SENTINEL};
