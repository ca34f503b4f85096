//! The default command: analyze a project and generate its artifacts.

use crate::artifact::ArtifactKind;
use crate::crash::CrashReporter;
use crate::error::{Result, ShipkitError};
use crate::pipeline::{AnalysisResult, Orchestrator};
use crate::request::AnalysisRequest;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct AnalyzeCommand {
    request: AnalysisRequest,
    orchestrator: Orchestrator,
    reporter: CrashReporter,
}

impl AnalyzeCommand {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            request,
            orchestrator: Orchestrator::default(),
            reporter: CrashReporter::default(),
        }
    }

    pub fn with_crash_reporter(mut self, reporter: CrashReporter) -> Self {
        self.reporter = reporter;
        self
    }

    fn report(&self, result: &AnalysisResult, ui: &mut dyn UserInterface) {
        let mut summary = format!("Detected {}", result.language);
        if !result.language_version.is_empty() {
            summary.push_str(&format!(" {}", result.language_version));
        }
        if !result.framework.is_empty() {
            summary.push_str(&format!(" ({})", result.framework));
        }
        ui.success(&summary);

        if !result.databases.is_empty() {
            ui.message(&format!("Databases: {}", result.databases.join(", ")));
        }

        if !result.warnings.is_empty() {
            ui.warning("Warnings:");
            for warning in &result.warnings {
                ui.warning(&format!(" * {}", warning));
            }
        }

        let project = self.request.project_path();
        ui.message("Now you can add the newly created Dockerfile to your git repository:");
        ui.show_hint(&format!("cd {}", project.display()));
        ui.show_hint("git add Dockerfile");
        ui.show_hint("git commit -m 'Adding Dockerfile'");

        if self.request.wants(ArtifactKind::ServiceDescriptor) {
            ui.message("To create a new stack from the generated service.yml run:");
            ui.show_hint(&format!(
                "cx stacks create --name='CHANGEME' --environment='{}' --service_yaml=service.yml",
                self.request.environment
            ));
        }
    }
}

impl Command for AnalyzeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        ui.show_header("shipkit");

        let result = self
            .reporter
            .guard("analyze", || self.orchestrator.analyze(&self.request, &mut *ui))
            .map_err(|report| ShipkitError::Other(anyhow::anyhow!(report.to_string())))??;

        self.report(&result, ui);
        ui.success("Done");
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TemplateSource;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn project_with_templates() -> (TempDir, TempDir) {
        let project = TempDir::new().unwrap();
        let templates = TempDir::new().unwrap();
        fs::write(project.path().join("Gemfile"), "gem 'rails', '7.1.3'\ngem 'pg'\n").unwrap();
        fs::write(project.path().join(".ruby-version"), "3.3.0\n").unwrap();
        fs::write(
            templates.path().join("ruby.dockerfile.template"),
            "FROM ruby:${language_version}\n",
        )
        .unwrap();
        fs::write(
            templates.path().join("ruby.service.yml.template"),
            "services:\n  ${project_name}:\n    command: ${start_command}\n",
        )
        .unwrap();
        (project, templates)
    }

    fn command(project: &TempDir, templates: &TempDir, generator: &str) -> AnalyzeCommand {
        let request = AnalysisRequest::new(project.path())
            .unattended(true)
            .with_artifacts(generator.parse().unwrap())
            .with_templates(TemplateSource::Local(templates.path().to_path_buf()));
        AnalyzeCommand::new(request)
            .with_crash_reporter(CrashReporter::new(templates.path().join("crash-reports")))
    }

    #[test]
    fn prints_git_hints_after_success() {
        let (project, templates) = project_with_templates();
        let mut ui = MockUI::new();

        let result = command(&project, &templates, "dockerfile")
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(project.path().join("Dockerfile").is_file());
        assert!(ui.has_hint("git add Dockerfile"));
        assert!(!ui.hints().iter().any(|h| h.contains("cx stacks create")));
    }

    #[test]
    fn service_generation_adds_stack_hint() {
        let (project, templates) = project_with_templates();
        let mut ui = MockUI::new();

        command(&project, &templates, "dockerfile,service")
            .execute(&mut ui)
            .unwrap();

        assert!(project.path().join("service.yml").is_file());
        assert!(ui.has_hint("--service_yaml=service.yml"));
    }

    #[test]
    fn fatal_errors_propagate() {
        let (project, templates) = project_with_templates();
        fs::write(project.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        let mut ui = MockUI::new();

        let err = command(&project, &templates, "dockerfile")
            .execute(&mut ui)
            .unwrap_err();

        assert!(matches!(err, ShipkitError::ArtifactExists { .. }));
        assert_eq!(
            fs::read_to_string(project.path().join("Dockerfile")).unwrap(),
            "FROM scratch\n"
        );
    }
}
