pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod middleware;
pub mod router;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::GalleryError;
pub use router::{GalleryState, gallery_router};
