//! Runtime adapters and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{list_budgets, submit_json, BudgetSnapshot};
pub use tokio_spawner::TokioSpawner;
