//! Rule store
//!
//! Read-through/write-through persistence of the [`RuleDocument`]. Nothing is
//! cached between calls: every render re-reads the file so an update through
//! the control API is visible to the very next panel or ticket.
//!
//! Neither operation fails outward. A missing or corrupt file loads as the
//! empty document, and a failed save reports `false`.

use crate::error::{Result, TicketError};
use crate::types::RuleDocument;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Default location of the rules document
pub const DEFAULT_RULES_PATH: &str = "ticketRules.json";

/// JSON-file backed rule store
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current document, defaulting to empty rules on any failure
    pub async fn load(&self) -> RuleDocument {
        match self.try_load().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to load rules from {:?}: {}", self.path, e);
                RuleDocument::default()
            }
        }
    }

    /// Persist the document, replacing the previous one; returns success
    pub async fn save(&self, doc: &RuleDocument) -> bool {
        match self.try_save(doc).await {
            Ok(()) => {
                debug!(
                    "Saved {} panel rules and {} ticket rules to {:?}",
                    doc.panel_rules.len(),
                    doc.ticket_rules.len(),
                    self.path
                );
                true
            }
            Err(e) => {
                error!("Failed to save rules to {:?}: {}", self.path, e);
                false
            }
        }
    }

    async fn try_load(&self) -> Result<RuleDocument> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write to a fresh sibling temp file, then rename over the target
    async fn try_save(&self, doc: &RuleDocument) -> Result<()> {
        let rendered = serde_json::to_string_pretty(doc)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, rendered.as_bytes()))
            .await
            .map_err(|e| TicketError::Other(format!("Rule save task failed: {}", e)))?
    }
}

/// One temp file per call; it is removed if anything fails before the rename.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_RULES_PATH.into());

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(DEFAULT_RULES_PATH)
    }
}
