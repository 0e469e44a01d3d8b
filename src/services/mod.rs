// Services module - PAN protection and card use cases

pub mod card_service;
pub mod encryption;
pub mod masking;
pub mod pan_validation;
