pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::LocalStorage;

pub use core::action::{Action, TableId};
pub use core::dashboard::{DashboardEngine, DashboardView, Session};
pub use core::dataset::Dataset;
pub use core::filter::{select_points, FilterSession, Redraw};
pub use domain::model::{FilterKind, FilterState, Payload, ProjectPoint};
pub use utils::error::{DashboardError, Result};
