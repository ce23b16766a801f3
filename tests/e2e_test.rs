//! End-to-end tests against a running gateway
//!
//! These tests require:
//! 1. The gateway running with storage and provider credentials configured
//! 2. Network access to the configured provider
//!
//! Run with: cargo test --test e2e_test -- --ignored --nocapture
//!
//! Set API_BASE_URL to override default (http://localhost:10000)

mod fixtures;

use fixtures::*;
use reqwest::multipart;
use serde_json::Value;
use std::time::Duration;

/// Get base URL from env or default to localhost
fn get_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:10000".to_string())
}

fn media_form(aspect_ratio: &str) -> multipart::Form {
    let image = multipart::Part::bytes(PORTRAIT_PNG.bytes())
        .file_name(PORTRAIT_PNG.filename)
        .mime_str(PORTRAIT_PNG.mime_type)
        .unwrap();
    let audio = multipart::Part::bytes(VOICE_MP3.bytes())
        .file_name(VOICE_MP3.filename)
        .mime_str(VOICE_MP3.mime_type)
        .unwrap();

    multipart::Form::new()
        .part("image", image)
        .part("audio", audio)
        .text("aspectRatio", aspect_ratio.to_string())
}

#[tokio::test]
#[ignore] // Requires a running gateway
async fn test_e2e_health_check() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("Health check failed");

    assert!(
        response.status().is_success(),
        "Health check returned non-success status: {}",
        response.status()
    );

    let body: Value = response.json().await.expect("Health body was not JSON");
    println!(
        "✓ Health: {} (storage: {}, provider: {})",
        body["status"], body["services"]["storage"], body["services"]["generationProvider"]
    );
}

#[tokio::test]
#[ignore] // Requires a running gateway with live credentials
async fn test_e2e_generate_portrait_video() {
    let base_url = get_base_url();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .unwrap();

    println!(
        "Generating from {} + {}",
        PORTRAIT_PNG.description, VOICE_MP3.description
    );

    let response = client
        .post(format!("{}/generate", base_url))
        .multipart(media_form("9:16"))
        .send()
        .await
        .expect("Generate request failed");

    let status = response.status();
    let body: Value = response.json().await.expect("Generate body was not JSON");
    println!("  Response ({}): {}", status, body);

    match status.as_u16() {
        200 => {
            let video_url = body["videoUrl"].as_str().expect("videoUrl missing");
            assert!(video_url.starts_with("http"));
            assert_ne!(Some(video_url), body["imageUrl"].as_str());
            println!("  ✓ Video ready: {}", video_url);
        }
        202 => {
            let job_id = body["jobId"].as_str().expect("jobId missing");
            wait_for_job(&client, &base_url, job_id).await;
        }
        _ => {
            assert_eq!(body["success"], Value::Bool(false));
            assert!(body["code"].is_string());
            println!("  ⚠ Generation failed: {}", body["error"]);
        }
    }
}

/// Poll `/status/{job_id}` until the job leaves the pending state.
async fn wait_for_job(client: &reqwest::Client, base_url: &str, job_id: &str) {
    let mut last_progress = 0;

    for attempt in 1..=60 {
        let status: Value = client
            .get(format!("{}/status/{}", base_url, job_id))
            .send()
            .await
            .expect("Status request failed")
            .json()
            .await
            .expect("Status body was not JSON");

        match status["status"].as_str() {
            Some("completed") => {
                println!("  ✓ Job {} completed: {}", job_id, status["videoUrl"]);
                return;
            }
            Some("failed") => {
                println!("  ⚠ Job {} failed: {}", job_id, status["error"]);
                return;
            }
            _ => {
                if let Some(progress) = status["progress"].as_u64() {
                    println!("  [{}] {}%", attempt, progress);
                    assert!(progress >= last_progress, "progress went backwards");
                    last_progress = progress;
                }
            }
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    panic!("Job {} still pending after 60 checks", job_id);
}
