//! `sotto models ...`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sotto_core::paths;
use sotto_models::{
    DirectoryResourceLoader, ModelManager, ModelManagerEvent, ModelOperation, ModelStatus,
    ProgressOperation,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::cli::ModelsAction;

pub async fn run(action: ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => list(&manager(None)?).await,
        ModelsAction::Download { model_id } => download(&manager(None)?, &model_id).await,
        ModelsAction::Delete { model_id } => delete(&manager(None)?, &model_id).await,
        ModelsAction::ExtractDefault { resources } => {
            let manager = manager(resources)?;
            manager
                .extract_default_model()
                .await
                .context("Failed to install the default model")?;
            let id = manager.catalog().default_model_id().to_string();
            println!("Installed {} at {}", id, manager.model_path(&id).display());
            Ok(())
        }
    }
}

/// Bundled files live under `{data_dir}/resources` unless overridden
fn manager(resources: Option<PathBuf>) -> Result<ModelManager> {
    let root = resources.unwrap_or_else(|| paths::data_dir().join("resources"));
    debug!("Using resource directory {}", root.display());
    ModelManager::new(Arc::new(DirectoryResourceLoader::new(root)))
        .context("Failed to create model manager")
}

async fn list(manager: &ModelManager) -> Result<()> {
    println!("Available models:");
    for status in manager.list_models().await {
        let installed = if status.downloaded {
            let bytes = manager.installed_size(&status.model.id).await;
            format!("installed, {:.1} MB on disk", bytes as f64 / (1024.0 * 1024.0))
        } else {
            "not installed".to_string()
        };
        println!("  {} ({})", format_status(&status), installed);
    }
    Ok(())
}

fn format_status(status: &ModelStatus) -> String {
    let model = &status.model;
    let languages = if model.is_multilingual() {
        "multilingual".to_string()
    } else {
        model
            .languages
            .iter()
            .map(|l| l.iso2)
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        "{} {:<32} {} [{}, {}, {}]",
        if status.downloaded { "*" } else { " " },
        model.id,
        model.display_name,
        model.provider.name(),
        languages,
        model.size_string()
    )
}

async fn download(manager: &ModelManager, model_id: &str) -> Result<()> {
    let renderer = tokio::spawn(render_progress(manager.subscribe(), model_id.to_string()));
    let result = manager.download_model(model_id).await;
    // The renderer exits on the Completed/Error event for this model
    let _ = renderer.await;

    result.with_context(|| format!("Failed to install {}", model_id))?;
    println!("Installed {} at {}", model_id, manager.model_path(model_id).display());
    Ok(())
}

async fn delete(manager: &ModelManager, model_id: &str) -> Result<()> {
    if manager.catalog().get_model(model_id).is_none() {
        anyhow::bail!("Unknown model: {}", model_id);
    }
    manager
        .delete_model(model_id)
        .await
        .with_context(|| format!("Failed to delete {}", model_id))?;
    println!("Deleted {}", model_id);
    Ok(())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

async fn render_progress(mut events: broadcast::Receiver<ModelManagerEvent>, model_id: String) {
    let pb = ProgressBar::new_spinner();
    let mut sized = false;

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                debug!("Progress renderer skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if event.model_id() != model_id {
            continue;
        }

        match event {
            ModelManagerEvent::Progress {
                operation: ProgressOperation::Downloading,
                bytes_processed,
                total_bytes,
                ..
            } => {
                if let (Some(total), false) = (total_bytes, sized) {
                    pb.set_length(total);
                    pb.set_style(bar_style());
                    sized = true;
                }
                if let Some(bytes) = bytes_processed {
                    pb.set_position(bytes);
                }
                pb.tick();
            }
            ModelManagerEvent::Progress { message, .. } => {
                pb.set_message(message);
                pb.tick();
            }
            ModelManagerEvent::Completed {
                operation: ModelOperation::Download,
                ..
            } => {
                pb.finish_and_clear();
                break;
            }
            ModelManagerEvent::Error { message, .. } => {
                pb.abandon_with_message(message);
                break;
            }
            ModelManagerEvent::Completed { .. } => {}
        }
    }
}
