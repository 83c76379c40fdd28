mod api;

pub use api::{ServiceInfo, SumQuery, SumRequest};
