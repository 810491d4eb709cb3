pub mod auth;
pub mod classify;
pub mod client;
pub mod enrich;
pub mod service;

pub use crate::domain::model::{Partner, Titulo, TitulosQuery, TitulosResponse};
pub use crate::domain::ports::{PartnerDirectory, ReceivablesSource, Storage};
pub use crate::utils::error::Result;
