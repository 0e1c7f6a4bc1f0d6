pub mod cli;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod logging;
pub mod model;
pub mod models;
pub mod ui;
pub mod view;
