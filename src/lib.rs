pub mod app;
pub mod config;
pub mod error;
pub mod filters;
pub mod home;
pub mod links;
pub mod models;
pub mod search;
pub mod selector;
pub mod tmdb;
