// src/handlers.rs

use serde::Deserialize;

use crate::common::error::AppError;

pub mod admin;
pub mod auth;
pub mod backup;
pub mod businesses;
pub mod companies;
pub mod employees;
pub mod permissions;
pub mod search;
pub mod session;
pub mod validations;

// `?confirm=true` das operações destrutivas
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    pub fn require(&self) -> Result<(), AppError> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::ConfirmationRequired)
        }
    }
}
