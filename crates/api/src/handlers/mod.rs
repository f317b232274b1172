//! HTTP handlers. Thin wrappers that parse input, call the quality service
//! or monitor, and wrap the result in [`DataResponse`](crate::response::DataResponse).

pub mod monitoring;
pub mod quality;
