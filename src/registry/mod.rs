//! Collectors for the upstream and mirror registries

pub mod error;
pub mod mirror;
pub mod signature;
pub mod upstream;

pub use mirror::AcrRegistry;
pub use upstream::DockerHubRegistry;
