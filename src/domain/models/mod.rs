mod category;
mod conversation;
mod coordinator_options;
mod model_profile;
mod model_response;

pub use category::*;
pub use conversation::*;
pub use coordinator_options::*;
pub use model_profile::*;
pub use model_response::*;
