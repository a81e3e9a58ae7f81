mod demo;
mod extract;
mod handlers;
mod models;
mod state;
mod util;

pub use handlers::{build_router, run_server, EXTRACT_PATH};
