pub mod config;
pub mod error;
pub mod recording_result;
pub mod request;
pub mod state;
pub mod video_models;
