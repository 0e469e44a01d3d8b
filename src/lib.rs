// Library exports for testing and modular access

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

pub use db::{CardRepository, MemoryCardRepository, PgCardRepository};
pub use error::{AppError, Result};
pub use services::card_service::CardService;
pub use services::encryption::PanCodec;
