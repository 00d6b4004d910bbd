//! Core domain logic: errors, types, crypto and the command protocol

pub mod command;
pub mod crypto;
pub mod error;
pub mod types;
