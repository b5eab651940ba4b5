pub mod admin;
pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod interaction;
pub mod repo;
pub mod server;

pub use self::{
    config::Config,
    interaction::{Interaction, Notice},
    repo::Repository,
};
