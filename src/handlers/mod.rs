use crate::{config::Config, database::Database};

pub mod auth;
pub mod favorites;
pub mod health;
pub mod prompts;
pub mod redeem;
pub mod requests;
pub mod stats;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
}
