//! Command handlers

pub mod geocode;
pub mod plan;

use std::path::Path;

use anyhow::{Context, Result};

/// Write a response body to `path`, or to stdout when none is given
async fn write_output(path: Option<&Path>, body: &str) -> Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", body);
            Ok(())
        }
    }
}
