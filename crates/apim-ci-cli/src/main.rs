//! APIM CI - dynamic CircleCI configuration generator
//!
//! The `apim-ci` command reads the build environment (flags, falling back to
//! CircleCI environment variables), generates the pipeline for the requested
//! action and writes it as a CircleCI 2.1 document.
//!
//! Exits non-zero without writing anything when the inputs are incomplete.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use apim_ci::obs;
use apim_ci::{
    generate, init_tracing, serialize, DocumentDigest, DocumentWriter, EnvironmentFacts,
    FsDocumentWriter, GeneratorConfig, GeneratorContext, GitDiffProvider, PomVersionReader,
    RawEnvironment,
};

/// Output destination that means "write to stdout".
const STDOUT: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "apim-ci")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate the APIM CircleCI dynamic configuration", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Branch being built
    #[arg(long, env = "CIRCLE_BRANCH")]
    branch: Option<String>,

    /// Branch the change set is computed against
    #[arg(long, env = "BASE_BRANCH")]
    base_branch: Option<String>,

    /// Commit being built
    #[arg(long, env = "CIRCLE_SHA1")]
    commit_sha: Option<String>,

    /// CI build number
    #[arg(long, env = "CIRCLE_BUILD_NUM")]
    build_id: Option<String>,

    /// Action keyword (pull_requests, build_rpm, build_docker_images, release, nexus_staging)
    #[arg(long, env = "ACTION")]
    action: Option<String>,

    /// Generate a dry run; only the literal `true` enables it
    #[arg(long, env = "IS_DRY_RUN", num_args = 0..=1, default_missing_value = "true")]
    dry_run: Option<String>,

    /// Also tag images as `latest`; only the literal `true` enables it
    #[arg(long, env = "DOCKER_TAG_AS_LATEST", num_args = 0..=1, default_missing_value = "true")]
    docker_tag_as_latest: Option<String>,

    /// Version to build or release
    #[arg(long, env = "APIM_VERSION")]
    apim_version: Option<String>,

    /// Project descriptor holding the release version
    #[arg(long, env = "APIM_VERSION_PATH")]
    version_file: Option<String>,

    /// Output path, `-` for stdout
    #[arg(short, long, env = "DYNAMIC_CONFIG_PATH", default_value = "dynamicConfig.yml")]
    output: String,

    /// Generator configuration file (TOML)
    #[arg(long, env = "APIM_CI_CONFIG")]
    config: Option<PathBuf>,

    /// Repository checkout used for change detection
    #[arg(long, default_value = ".")]
    repo_dir: PathBuf,
}

impl Cli {
    fn raw_environment(&self) -> RawEnvironment {
        RawEnvironment {
            branch: self.branch.clone(),
            base_branch: self.base_branch.clone(),
            commit_sha: self.commit_sha.clone(),
            build_id: self.build_id.clone(),
            action: self.action.clone(),
            dry_run: self.dry_run.clone(),
            docker_tag_as_latest: self.docker_tag_as_latest.clone(),
            version: self.apim_version.clone(),
            version_file_path: self.version_file.clone(),
        }
    }

    fn generator_config(&self) -> Result<GeneratorConfig> {
        match &self.config {
            Some(path) => GeneratorConfig::load(path)
                .with_context(|| format!("Failed to load generator config {}", path.display())),
            None => Ok(GeneratorConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = cli.generator_config()?;
    let diff = GitDiffProvider::new(&cli.repo_dir);
    let facts = EnvironmentFacts::assemble(cli.raw_environment(), &config.trunk, &diff)
        .context("Invalid build environment")?;

    let document = render(&facts, &config)?;
    write_document(&document, &cli.output)
}

/// Generate and serialize the pipeline for `facts`.
fn render(facts: &EnvironmentFacts, config: &GeneratorConfig) -> Result<String> {
    let versions = PomVersionReader;
    let ctx = GeneratorContext::new(config, &versions);
    let pipeline = generate(facts, &ctx)
        .with_context(|| format!("Failed to generate pipeline for action '{}'", facts.action))?;
    serialize(&pipeline).context("Failed to serialize pipeline")
}

fn write_document(document: &str, output: &str) -> Result<()> {
    let digest = DocumentDigest::of(document);

    if output == STDOUT {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(document.as_bytes())
            .context("Failed to write pipeline to stdout")?;
        stdout.flush()?;
    } else {
        FsDocumentWriter
            .write(document, Path::new(output))
            .with_context(|| format!("Failed to write pipeline to {output}"))?;
    }

    obs::emit_document_written(output, digest.as_str(), document.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apim_ci::ActionKind;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["apim-ci"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_map_to_raw_environment() {
        let cli = parse(&[
            "--branch",
            "4.2.x",
            "--base-branch",
            "4.2.x",
            "--commit-sha",
            "0123456789",
            "--action",
            "release",
            "--apim-version",
            "4.2.0",
            "--version-file",
            "/tmp/pom.xml",
            "--output",
            "-",
        ]);
        let raw = cli.raw_environment();
        assert_eq!(raw.branch.as_deref(), Some("4.2.x"));
        assert_eq!(raw.action.as_deref(), Some("release"));
        assert_eq!(raw.version.as_deref(), Some("4.2.0"));
        assert_eq!(raw.version_file_path.as_deref(), Some("/tmp/pom.xml"));
        assert_eq!(cli.output, STDOUT);
    }

    #[test]
    fn test_bare_dry_run_flag_means_true() {
        let cli = parse(&["--dry-run", "--commit-sha", "abc"]);
        assert_eq!(cli.dry_run.as_deref(), Some("true"));

        let cli = parse(&["--dry-run=TRUE", "--commit-sha", "abc"]);
        let facts = EnvironmentFacts::assemble(
            RawEnvironment {
                action: Some("build_rpm".to_string()),
                ..cli.raw_environment()
            },
            "master",
            &apim_ci::fakes::StaticDiffProvider::new(Vec::<String>::new()),
        )
        .unwrap();
        assert!(!facts.is_dry_run);
    }

    #[test]
    fn test_render_writes_document_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/dynamicConfig.yml");
        let facts = EnvironmentFacts::new(ActionKind::BuildPackage, "0123456789")
            .with_branch("master")
            .with_version("4.2.0");

        let document = render(&facts, &GeneratorConfig::default()).unwrap();
        write_document(&document, output.to_str().unwrap()).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, document);
        assert!(written.starts_with("version: 2.1"));
    }

    #[test]
    fn test_render_reports_generation_failure() {
        let facts = EnvironmentFacts::new(ActionKind::BuildPackage, "0123456789");
        let err = render(&facts, &GeneratorConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("requires a version"));
    }
}
