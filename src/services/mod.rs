//! Services for loading, aggregating, rendering and publishing

pub mod aggregator;
pub mod assets;
pub mod loader;
pub mod platform;
pub mod publisher;
pub mod renderer;

pub use aggregator::Aggregator;
pub use assets::{CatalogueCovers, CoverArtProvider, NoCovers};
pub use platform::PlatformMap;
pub use publisher::PublishTarget;
