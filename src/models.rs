// src/models.rs

pub mod auth;
pub mod business;
pub mod company;
pub mod employee;
pub mod permission;
pub mod profile;
pub mod validation;
