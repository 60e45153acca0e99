pub mod client;
mod dto;
pub mod services;

pub use client::{GoogleVisionClient, LabelClient};
