//! The structured outcome of one analysis.

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// What the caller (CLI or daemon client) gets back.
///
/// `ok` is true only when every requested artifact was generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ok: bool,
    pub language: String,
    pub language_version: String,
    pub supported_language_versions: Vec<String>,
    pub framework: String,
    pub framework_version: String,
    pub databases: Vec<String>,
    pub warnings: Vec<String>,
    pub start_commands: Vec<String>,
    pub build_commands: Vec<String>,
    pub deploy_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Copy a capability's final detected state into a successful result.
    pub fn from_capability(capability: &dyn Capability) -> Self {
        let detected = capability.detected();
        Self {
            ok: true,
            language: capability.name().to_string(),
            language_version: detected.language_version.clone(),
            supported_language_versions: detected.supported_language_versions.clone(),
            framework: detected.framework.clone(),
            framework_version: detected.framework_version.clone(),
            databases: detected.databases.clone(),
            warnings: detected.messages.clone(),
            start_commands: detected.start_commands.clone(),
            build_commands: detected.build_commands.clone(),
            deploy_commands: detected.deploy_commands.clone(),
            error: None,
        }
    }

    /// A failed result carrying only the error message.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}
