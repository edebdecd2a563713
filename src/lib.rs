pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod download;
pub mod global;
pub mod jobs;
pub mod notice;
pub mod report;
pub mod session;
pub mod task;
pub mod upload;
