pub mod config;
pub mod controller;
pub mod message;
pub mod persistence;
pub mod session;
