mod provider_adapter;
mod stream_observer;

pub use provider_adapter::*;
pub use stream_observer::*;
