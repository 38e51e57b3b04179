//! REST surface over the workflow engine: workflows CRUD, run creation and
//! polling, artifact listing, health probes.

pub mod error;
pub mod health;
pub mod router;
pub mod runs;
pub mod state;
pub mod workflows;

pub use error::{ApiError, ApiErrorResponse};
pub use router::create_router;
pub use state::AppState;
