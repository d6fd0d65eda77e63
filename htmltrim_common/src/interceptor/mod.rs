pub mod layer;
pub mod switch;
pub mod writer;

pub use layer::{wrap, TrimLayer, TrimService, DEFAULT_MAX_BODY_SIZE};
pub use switch::TrimSwitch;
pub use writer::{ResponseWriter, TrimWriter};
