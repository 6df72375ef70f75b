// Image Resizer Library
// Resize stage for image-delivery pipelines

pub mod config;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod offload;
pub mod pipeline;
