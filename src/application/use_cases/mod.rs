mod classify_query;
mod coordinate;
mod dispatch;
mod provider_registry;
mod reduce;
mod score_response;
mod select_models;
mod stream_best;

pub use classify_query::*;
pub use coordinate::*;
pub use dispatch::*;
pub use provider_registry::*;
pub use reduce::*;
pub use score_response::*;
pub use select_models::*;
pub use stream_best::*;
