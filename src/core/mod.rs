pub mod action;
pub mod aggregate;
pub mod dashboard;
pub mod dataset;
pub mod filter;

pub use crate::domain::model::{FilterState, ProjectPoint};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
