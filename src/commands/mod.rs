pub mod completions;
pub mod config;
pub mod demo;
pub mod doctor;
pub mod kinds;
pub mod send;
