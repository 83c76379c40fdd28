mod demo;
mod docs;
mod info;

pub use demo::{sum, sum_post};
pub use docs::{API_DOCS_PATH, api_docs};
pub use info::service_info;
