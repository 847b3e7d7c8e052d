//! gemma-service: HTTP web service exposing a Gemma text-generation model.
//!
//! Model weights are fetched from the Kaggle model hub at startup and held
//! for the lifetime of the process. Inference is CPU-bound and blocking, so
//! request handlers offload it to the tokio blocking pool.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod startup;
