//! Newline-delimited JSON over TCP.
//!
//! Each line a client sends is one request; each reply is one line of
//! [`AnalysisResult`] JSON. Connections are served one at a time, so two
//! requests never touch the template cache concurrently.

use serde::Deserialize;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

use super::config::DaemonConfig;
use crate::artifact::ArtifactSet;
use crate::crash::CrashReporter;
use crate::detection::DetectionRunner;
use crate::error::{Result, ShipkitError};
use crate::pipeline::{AnalysisResult, Orchestrator};
use crate::request::{AnalysisRequest, DEFAULT_ENVIRONMENT};
use crate::ui::{NonInteractiveUI, OutputMode};

/// One request line.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonRequest {
    pub path: PathBuf,
    #[serde(default)]
    pub environment: Option<String>,
    /// Comma-separated artifact tokens, as for `--generator`.
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub git_repo: String,
    #[serde(default)]
    pub git_branch: String,
    #[serde(default)]
    pub overwrite: bool,
}

/// How long a connection may stay silent before it is dropped.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

type RunnerFactory = Box<dyn Fn() -> DetectionRunner>;

pub struct Daemon {
    config: DaemonConfig,
    orchestrator: Orchestrator,
    reporter: CrashReporter,
    runner: RunnerFactory,
    idle_timeout: Duration,
}

impl Daemon {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            orchestrator: config.orchestrator(),
            config,
            reporter: CrashReporter::default(),
            runner: Box::new(DetectionRunner::builtin),
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_crash_reporter(mut self, reporter: CrashReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the capability set built for each request.
    pub fn with_capabilities(mut self, runner: impl Fn() -> DetectionRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Turn a wire request into an unattended [`AnalysisRequest`].
    pub fn to_analysis_request(&self, request: DaemonRequest) -> std::result::Result<AnalysisRequest, String> {
        let artifacts = match request.generator.as_deref() {
            Some(tokens) if !tokens.trim().is_empty() => ArtifactSet::parse_generator(tokens)?,
            _ => ArtifactSet::new(),
        };

        Ok(AnalysisRequest::new(request.path)
            .with_environment(
                request
                    .environment
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            )
            .unattended(true)
            .allow_overwrite(request.overwrite)
            .with_artifacts(artifacts)
            .use_registry(self.config.use_registry)
            .with_templates(self.config.template_source())
            .with_branch(self.config.branch.as_str())
            .with_git(request.git_repo, request.git_branch))
    }

    /// Answer one request line. Never fails; errors become `ok: false`.
    pub fn handle_line(&self, line: &str) -> AnalysisResult {
        let request = match serde_json::from_str::<DaemonRequest>(line) {
            Ok(request) => request,
            Err(e) => return AnalysisResult::failure(format!("Invalid request: {}", e)),
        };
        let request = match self.to_analysis_request(request) {
            Ok(request) => request,
            Err(e) => return AnalysisResult::failure(format!("Invalid request: {}", e)),
        };

        tracing::info!("Analyzing {}", request.project_path.display());
        let mut ui = NonInteractiveUI::new(OutputMode::Silent);
        let outcome = self.reporter.guard("daemon request", || {
            self.orchestrator
                .analyze_with(&request, (self.runner)(), &mut ui)
        });

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!("Analysis of {} failed: {}", request.project_path.display(), e);
                AnalysisResult::failure(e)
            }
            Err(report) => AnalysisResult::failure(report),
        }
    }

    /// Serve every line of one connection until the client hangs up.
    pub fn serve_connection<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> std::io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let result = self.handle_line(&line);
            serde_json::to_writer(&mut writer, &result)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Accept connections until the process is interrupted.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        self.serve_incoming(listener.incoming());
        Ok(())
    }

    /// Serve each accepted stream in turn.
    ///
    /// A failed accept is logged and skipped. A client that stays silent
    /// longer than the idle timeout is disconnected so the next one can be
    /// served.
    pub fn serve_incoming<I>(&self, incoming: I)
    where
        I: IntoIterator<Item = std::io::Result<TcpStream>>,
    {
        for stream in incoming {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            let peer = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::debug!("Connection from {}", peer);

            if let Err(e) = self.serve_stream(stream) {
                tracing::warn!("Connection from {} ended with an error: {}", peer, e);
            }
        }
    }

    fn serve_stream(&self, stream: TcpStream) -> std::io::Result<()> {
        stream.set_read_timeout(Some(self.idle_timeout))?;
        let reader = BufReader::new(stream.try_clone()?);
        self.serve_connection(reader, BufWriter::new(stream))
    }

    /// Bind the configured address and serve forever.
    pub fn run(&self) -> Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address).map_err(|e| {
            ShipkitError::Other(anyhow::anyhow!("Unable to listen on {}: {}", address, e))
        })?;
        tracing::info!("Listening on {}", address);
        self.serve(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{AnalyzeContext, Capability, Detected, MarkerCapability};
    use crate::capability::marker::builtin_specs;
    use std::fs;
    use std::io::Cursor;
    use std::net::TcpStream;
    use std::path::Path;
    use tempfile::TempDir;

    struct Exploding {
        detected: Detected,
    }

    impl Capability for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }
        fn detect(&self, _project_root: &Path) -> bool {
            true
        }
        fn set_supported_language_versions(&mut self, _versions: Vec<String>) {}
        fn analyze(&mut self, _ctx: &AnalyzeContext<'_>) -> anyhow::Result<()> {
            panic!("analysis exploded")
        }
        fn write_container_build_file(&mut self, _: &Path, _: &Path, _: bool) -> anyhow::Result<()> {
            Ok(())
        }
        fn write_service_descriptor(&mut self, _: &Path, _: &Path, _: bool) -> anyhow::Result<()> {
            Ok(())
        }
        fn detected(&self) -> &Detected {
            &self.detected
        }
    }

    struct Fixture {
        project: TempDir,
        templates: TempDir,
        crashes: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let fixture = Self {
                project: TempDir::new().unwrap(),
                templates: TempDir::new().unwrap(),
                crashes: TempDir::new().unwrap(),
            };
            fs::write(
                fixture.templates.path().join("node.dockerfile.template"),
                "FROM node:${language_version}\nCMD ${start_command}\n",
            )
            .unwrap();
            fs::write(fixture.project.path().join("package.json"), "{}").unwrap();
            fixture
        }

        fn daemon(&self) -> Daemon {
            let config = DaemonConfig {
                templates: Some(self.templates.path().to_path_buf()),
                cache_dir: Some(self.crashes.path().join("cache")),
                ..DaemonConfig::default()
            };
            let node = builtin_specs()
                .into_iter()
                .find(|spec| spec.name == "node")
                .unwrap();
            Daemon::new(config)
                .with_crash_reporter(CrashReporter::new(self.crashes.path().join("reports")))
                .with_capabilities(move || {
                    DetectionRunner::new().with(Box::new(MarkerCapability::new(node)))
                })
        }

        fn request(&self) -> String {
            serde_json::json!({ "path": self.project.path() }).to_string()
        }
    }

    #[test]
    fn requests_are_unattended_with_config_defaults() {
        let fixture = Fixture::new();
        let daemon = fixture.daemon();
        let request = daemon
            .to_analysis_request(DaemonRequest {
                path: PathBuf::from("/srv/app"),
                environment: None,
                generator: Some("dockerfile,service".to_string()),
                git_repo: "git@github.com:acme/app.git".to_string(),
                git_branch: "main".to_string(),
                overwrite: true,
            })
            .unwrap();

        assert!(request.unattended);
        assert!(request.allow_overwrite);
        assert_eq!(request.environment, "production");
        assert_eq!(request.template_branch, "master");
        assert_eq!(request.git_branch, "main");
        assert!(request.wants(crate::artifact::ArtifactKind::ServiceDescriptor));
    }

    #[test]
    fn unknown_generator_is_rejected() {
        let fixture = Fixture::new();
        let result = fixture.daemon().handle_line(
            &serde_json::json!({ "path": "/srv/app", "generator": "dockerfile,helm" }).to_string(),
        );
        assert!(!result.ok);
        assert!(result.error.unwrap().contains("helm"));
    }

    #[test]
    fn malformed_json_is_a_failed_result() {
        let fixture = Fixture::new();
        let result = fixture.daemon().handle_line("{not json");
        assert!(!result.ok);
        assert!(result.error.unwrap().starts_with("Invalid request"));
    }

    #[test]
    fn successful_analysis_writes_dockerfile() {
        let fixture = Fixture::new();
        let result = fixture.daemon().handle_line(&fixture.request());

        assert!(result.ok, "{:?}", result.error);
        assert_eq!(result.language, "node");
        assert_eq!(result.language_version, "20");
        assert!(fixture.project.path().join("Dockerfile").is_file());
    }

    #[test]
    fn pipeline_errors_come_back_as_failures() {
        let fixture = Fixture::new();
        fs::write(fixture.project.path().join("Dockerfile"), "FROM scratch\n").unwrap();

        let result = fixture.daemon().handle_line(&fixture.request());
        assert!(!result.ok);
        assert!(result.error.unwrap().contains("Dockerfile"));
    }

    #[test]
    fn panics_become_failures_and_crash_reports() {
        let fixture = Fixture::new();
        let daemon = fixture.daemon().with_capabilities(|| {
            DetectionRunner::new().with(Box::new(Exploding {
                detected: Detected::default(),
            }))
        });

        let result = daemon.handle_line(&fixture.request());
        assert!(!result.ok);
        assert!(result.error.unwrap().contains("analysis exploded"));

        let reports: Vec<_> = fs::read_dir(fixture.crashes.path().join("reports"))
            .unwrap()
            .collect();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn serves_one_reply_per_line() {
        let fixture = Fixture::new();
        let input = format!("{}\n\n{{bad\n", fixture.request());
        let mut output = Vec::new();

        fixture
            .daemon()
            .serve_connection(Cursor::new(input), &mut output)
            .unwrap();

        let replies: Vec<AnalysisResult> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert!(replies[0].ok);
        assert!(!replies[1].ok);
    }

    #[test]
    fn serves_over_tcp() {
        let fixture = Fixture::new();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let request = fixture.request();

        let client = std::thread::spawn(move || {
            let mut stream = TcpStream::connect(address).unwrap();
            stream.write_all(format!("{}\n", request).as_bytes()).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
            let mut reply = String::new();
            BufReader::new(stream).read_line(&mut reply).unwrap();
            reply
        });

        let (stream, _) = listener.accept().unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        fixture.daemon().serve_connection(reader, stream).unwrap();

        let reply: AnalysisResult = serde_json::from_str(&client.join().unwrap()).unwrap();
        assert!(reply.ok);
        assert_eq!(reply.language, "node");
    }

    #[test]
    fn silent_client_does_not_block_the_next_one() {
        let fixture = Fixture::new();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let request = fixture.request();

        let client = std::thread::spawn(move || {
            let _idle = TcpStream::connect(address).unwrap();
            let mut stream = TcpStream::connect(address).unwrap();
            stream.write_all(format!("{}\n", request).as_bytes()).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
            let mut reply = String::new();
            BufReader::new(stream).read_line(&mut reply).unwrap();
            reply
        });

        let aborted = std::io::Error::new(std::io::ErrorKind::ConnectionAborted, "aborted");
        fixture
            .daemon()
            .with_idle_timeout(Duration::from_millis(200))
            .serve_incoming(std::iter::once(Err(aborted)).chain(listener.incoming().take(2)));

        let reply: AnalysisResult = serde_json::from_str(&client.join().unwrap()).unwrap();
        assert!(reply.ok);
        assert_eq!(reply.language, "node");
    }
}
