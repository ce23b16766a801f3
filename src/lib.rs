//! Lip-sync video generation gateway
//!
//! Accepts a portrait image and an audio clip, stores both in S3-compatible
//! object storage, submits them to a configurable lip-sync generation
//! provider (Hedra, RunPod Wav2Lip, VisionStory, Replicate) and either polls
//! the job to completion or hands back the job id for status polling.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
