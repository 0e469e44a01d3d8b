// Models module - Card records and their caller-facing views

pub mod card;

pub use card::{Card, CardRequest, CardResponse, CreateCardData, LastFourSearch};
