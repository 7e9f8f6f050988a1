pub mod analysis;
pub mod cli;
pub mod closure;
pub mod config;
pub mod extraneous;
pub mod graph;
pub mod model;
pub mod requirements;
pub mod site_packages;

mod api;

pub use api::{Extraneous, ExtraneousBuilder};
