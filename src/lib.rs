pub mod clock;
pub mod comparison;
pub mod config;
pub mod geo;
pub mod legend;
pub mod model;
pub mod poller;
pub mod rng;
pub mod service;
pub mod simulators;
pub mod snapshot;
pub mod statistics;
pub mod timeline;
pub mod web;

pub use config::{ConfigLoader, DashboardConfig};
pub use poller::LayerPoller;
pub use service::{EnvironmentService, ServiceBuilder, ServiceSettings};
pub use simulators::LayerKind;
