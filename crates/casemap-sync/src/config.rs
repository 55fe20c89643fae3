//! Mind-map configuration
//!
//! Labels and notice wording. Every field has a default, so a partial TOML
//! document (or none at all) is valid.

use anyhow::Context;
use casemap_edit::{FailureKind, InterpreterOptions, NoticeKey};
use casemap_model::BuildOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration parse failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Document is not valid TOML for this schema
    #[error("invalid mind-map config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Labels and texts used by the mind-map view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindmapConfig {
    /// Label of the synthetic root node
    pub root_label: String,
    /// Label of a case with no name
    pub unnamed_case_label: String,
    /// Name given to cases created from the menu
    pub new_case_name: String,
    /// Notice wording
    pub notices: NoticeTexts,
}

impl Default for MindmapConfig {
    fn default() -> Self {
        Self {
            root_label: "All cases".to_string(),
            unnamed_case_label: "(unnamed case)".to_string(),
            new_case_name: "New case".to_string(),
            notices: NoticeTexts::default(),
        }
    }
}

impl MindmapConfig {
    /// Parse from a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] when the document does not match the schema.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading mind-map config {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("parsing mind-map config {}", path.display()))
    }

    /// Options for the tree builder
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            root_label: self.root_label.clone(),
            unnamed_case_label: self.unnamed_case_label.clone(),
        }
    }

    /// Options for the edit interpreter
    #[must_use]
    pub fn interpreter_options(&self) -> InterpreterOptions {
        InterpreterOptions {
            unnamed_case_label: self.unnamed_case_label.clone(),
            new_case_name: self.new_case_name.clone(),
        }
    }
}

/// User-facing notice texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeTexts {
    pub save_failed: String,
    pub move_failed: String,
    pub delete_failed: String,
    pub action_failed: String,
    pub load_failed: String,
    pub delete_succeeded: String,
    pub precondition_exists: String,
    pub remark_exists: String,
    pub text_description_exists: String,
    pub add_case_needs_module: String,
    pub rename_needs_module: String,
    pub rename_needs_name: String,
    pub needs_case_node: String,
    pub text_mode_has_no_steps: String,
    pub insert_needs_step: String,
    pub delete_unsupported: String,
}

impl Default for NoticeTexts {
    fn default() -> Self {
        Self {
            save_failed: "Save failed".to_string(),
            move_failed: "Move failed".to_string(),
            delete_failed: "Delete failed".to_string(),
            action_failed: "Action failed".to_string(),
            load_failed: "Failed to load the mind map".to_string(),
            delete_succeeded: "Deleted".to_string(),
            precondition_exists: "The precondition already has content".to_string(),
            remark_exists: "The remark already has content".to_string(),
            text_description_exists: "The text description already exists".to_string(),
            add_case_needs_module: "Select a module to add a case".to_string(),
            rename_needs_module: "Only modules can be renamed".to_string(),
            rename_needs_name: "Enter a module name".to_string(),
            needs_case_node: "Select a case first".to_string(),
            text_mode_has_no_steps: "Text-mode cases have no steps".to_string(),
            insert_needs_step: "Select a step to insert beside".to_string(),
            delete_unsupported: "This node cannot be deleted".to_string(),
        }
    }
}

impl NoticeTexts {
    /// Text for a plan notice
    #[must_use]
    pub fn text(&self, key: NoticeKey) -> &str {
        match key {
            NoticeKey::PreconditionExists => &self.precondition_exists,
            NoticeKey::RemarkExists => &self.remark_exists,
            NoticeKey::TextDescriptionExists => &self.text_description_exists,
            NoticeKey::AddCaseNeedsModule => &self.add_case_needs_module,
            NoticeKey::RenameNeedsModule => &self.rename_needs_module,
            NoticeKey::RenameNeedsName => &self.rename_needs_name,
            NoticeKey::NeedsCaseNode => &self.needs_case_node,
            NoticeKey::TextModeHasNoSteps => &self.text_mode_has_no_steps,
            NoticeKey::InsertNeedsStep => &self.insert_needs_step,
            NoticeKey::DeleteUnsupported => &self.delete_unsupported,
        }
    }

    /// Default failure text
    #[must_use]
    pub fn failure(&self, kind: FailureKind) -> &str {
        match kind {
            FailureKind::Save => &self.save_failed,
            FailureKind::Move => &self.move_failed,
            FailureKind::Delete => &self.delete_failed,
            FailureKind::Action => &self.action_failed,
        }
    }
}
