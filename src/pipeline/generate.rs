//! Ordered artifact generation for the chosen capability.

use std::path::Path;

use crate::artifact::ArtifactKind;
use crate::capability::{AnalyzeContext, Capability};
use crate::detection::ConflictGuard;
use crate::error::{Result, ShipkitError};
use crate::request::AnalysisRequest;

fn render_error(kind: ArtifactKind) -> impl FnOnce(anyhow::Error) -> ShipkitError {
    move |source| ShipkitError::Render { kind, source }
}

/// Analyze the project, then write each requested artifact in order.
///
/// The container build file is always written. The orchestration manifest
/// and the bundle re-check their destinations first, since an earlier step
/// may have produced them.
pub fn generate(
    capability: &mut dyn Capability,
    request: &AnalysisRequest,
    template_dir: &Path,
    guard: &ConflictGuard,
) -> Result<()> {
    let project = request.project_path();
    let interactive = request.interactive();

    capability
        .analyze(&AnalyzeContext {
            project_path: project,
            environment: &request.environment,
            interactive,
            git_repo: &request.git_repo,
            git_branch: &request.git_branch,
        })
        .map_err(ShipkitError::Analysis)?;

    capability
        .write_container_build_file(template_dir, project, interactive)
        .map_err(render_error(ArtifactKind::ContainerBuildFile))?;

    if request.wants(ArtifactKind::ServiceDescriptor) {
        capability
            .write_service_descriptor(template_dir, project, interactive)
            .map_err(render_error(ArtifactKind::ServiceDescriptor))?;
    }

    if request.wants(ArtifactKind::OrchestrationManifest) {
        guard.check_one(project, ArtifactKind::OrchestrationManifest, capability)?;
        capability
            .write_orchestration_manifest(project, interactive)
            .map_err(render_error(ArtifactKind::OrchestrationManifest))?;
    }

    if request.wants(ArtifactKind::DeploymentBundle) {
        guard.check_one(project, ArtifactKind::DeploymentBundle, capability)?;
        capability
            .create_deployment_bundle(project, template_dir, &request.template_branch)
            .map_err(render_error(ArtifactKind::DeploymentBundle))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactSet;
    use crate::capability::{Detected, DescriptorCapability};
    use std::fs;
    use tempfile::TempDir;

    /// Records the order of calls and optionally fails one step.
    struct Recorder {
        calls: Vec<&'static str>,
        fail_at: Option<&'static str>,
        detected: Detected,
    }

    impl Recorder {
        fn step(&mut self, name: &'static str) -> anyhow::Result<()> {
            self.calls.push(name);
            if self.fail_at == Some(name) {
                anyhow::bail!("{} exploded", name);
            }
            Ok(())
        }
    }

    impl Capability for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn detect(&self, _: &Path) -> bool {
            true
        }
        fn set_supported_language_versions(&mut self, versions: Vec<String>) {
            self.detected.supported_language_versions = versions;
        }
        fn analyze(&mut self, _: &AnalyzeContext<'_>) -> anyhow::Result<()> {
            self.detected.warn("analysis note");
            self.step("analyze")
        }
        fn write_container_build_file(&mut self, _: &Path, _: &Path, _: bool) -> anyhow::Result<()> {
            self.step("dockerfile")
        }
        fn write_service_descriptor(&mut self, _: &Path, _: &Path, _: bool) -> anyhow::Result<()> {
            self.step("service")
        }
        fn write_orchestration_manifest(&mut self, _: &Path, _: bool) -> anyhow::Result<()> {
            self.step("kube")
        }
        fn create_deployment_bundle(&mut self, _: &Path, _: &Path, _: &str) -> anyhow::Result<()> {
            self.step("bundle")
        }
        fn detected(&self) -> &Detected {
            &self.detected
        }
    }

    fn recorder(fail_at: Option<&'static str>) -> Recorder {
        Recorder {
            calls: Vec::new(),
            fail_at,
            detected: Detected::default(),
        }
    }

    fn request(temp: &TempDir, kinds: &[ArtifactKind]) -> AnalysisRequest {
        AnalysisRequest::new(temp.path())
            .unattended(true)
            .with_artifacts(ArtifactSet::from_kinds(kinds.iter().copied()))
    }

    #[test]
    fn runs_every_requested_step_in_order() {
        let temp = TempDir::new().unwrap();
        let mut capability = recorder(None);

        generate(
            &mut capability,
            &request(&temp, &ArtifactKind::ALL),
            temp.path(),
            &ConflictGuard::new(false),
        )
        .unwrap();

        assert_eq!(
            capability.calls,
            vec!["analyze", "dockerfile", "service", "kube", "bundle"]
        );
        assert_eq!(capability.detected().messages, vec!["analysis note"]);
    }

    #[test]
    fn dockerfile_only_skips_optional_steps() {
        let temp = TempDir::new().unwrap();
        let mut capability = recorder(None);

        generate(
            &mut capability,
            &request(&temp, &[]),
            temp.path(),
            &ConflictGuard::new(false),
        )
        .unwrap();

        assert_eq!(capability.calls, vec!["analyze", "dockerfile"]);
    }

    #[test]
    fn analysis_failure_stops_before_rendering() {
        let temp = TempDir::new().unwrap();
        let mut capability = recorder(Some("analyze"));

        let err = generate(
            &mut capability,
            &request(&temp, &ArtifactKind::ALL),
            temp.path(),
            &ConflictGuard::new(false),
        )
        .unwrap_err();

        assert!(matches!(err, ShipkitError::Analysis(_)));
        assert_eq!(capability.calls, vec!["analyze"]);
    }

    #[test]
    fn render_failure_names_the_artifact_and_stops() {
        let temp = TempDir::new().unwrap();
        let mut capability = recorder(Some("service"));

        let err = generate(
            &mut capability,
            &request(&temp, &ArtifactKind::ALL),
            temp.path(),
            &ConflictGuard::new(false),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ShipkitError::Render {
                kind: ArtifactKind::ServiceDescriptor,
                ..
            }
        ));
        assert_eq!(
            capability.calls,
            vec!["analyze", "dockerfile", "service"]
        );
    }

    #[test]
    fn bundle_destination_is_rechecked() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("starter.bundle"), "").unwrap();
        let mut capability = recorder(None);

        let err = generate(
            &mut capability,
            &request(&temp, &[ArtifactKind::DeploymentBundle]),
            temp.path(),
            &ConflictGuard::new(false),
        )
        .unwrap_err();

        assert!(matches!(err, ShipkitError::ArtifactExists { .. }));
        assert_eq!(capability.calls, vec!["analyze", "dockerfile"]);
    }

    #[test]
    fn malformed_descriptor_fails_analysis() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("service.yml"), "services: [").unwrap();
        let mut capability = DescriptorCapability::new();

        let err = generate(
            &mut capability,
            &request(&temp, &[ArtifactKind::OrchestrationManifest]),
            temp.path(),
            &ConflictGuard::new(false),
        )
        .unwrap_err();

        assert!(matches!(err, ShipkitError::Analysis(_)));
    }
}
