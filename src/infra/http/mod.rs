mod form;
mod middleware;
mod multipart;
mod public;

pub use public::{HttpState, build_router};
