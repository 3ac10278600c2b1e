// crates/release-gate-cli/src/main.rs
// ============================================================================
// Module: Release Gate CLI Entry Point
// Description: Command dispatcher for Release Gate policy and attestation tasks.
// Purpose: Provide a safe, localized CLI over the release-gate core.
// Dependencies: clap, release-gate-config, release-gate-core, serde_jcs, thiserror.
// ============================================================================

//! ## Overview
//! The Release Gate CLI validates configuration and policy documents, creates
//! release attestation statements, and evaluates deployments against a
//! directory of pre-verified attestation bundles. All user-facing strings are
//! routed through the i18n catalog. Security posture: inputs are untrusted
//! and must be validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use release_gate_cli::bundle::BundleDirectoryVerifier;
use release_gate_cli::t;
use release_gate_config::ReleaseGateConfig;
use release_gate_core::Creation;
use release_gate_core::CreationOption;
use release_gate_core::DeploymentGate;
use release_gate_core::DigestSet;
use release_gate_core::PolicyId;
use release_gate_core::ReleaseDecision;
use release_gate_core::ReleaseVerifier;
use release_gate_core::Subject;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "release-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Deployment policy utilities.
    Policy {
        /// Selected policy subcommand.
        #[command(subcommand)]
        command: PolicyCommand,
    },
    /// Release attestation utilities.
    Attestation {
        /// Selected attestation subcommand.
        #[command(subcommand)]
        command: AttestationCommand,
    },
    /// Deployment evaluation utilities.
    Deployment {
        /// Selected deployment subcommand.
        #[command(subcommand)]
        command: DeploymentCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Release Gate configuration file.
    Validate(ConfigArgs),
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Load and validate the configured deployment policy documents.
    Validate(ConfigArgs),
}

/// Attestation subcommands.
#[derive(Subcommand, Debug)]
enum AttestationCommand {
    /// Create a release attestation statement as canonical JSON.
    Create(AttestationCreateCommand),
}

/// Deployment subcommands.
#[derive(Subcommand, Debug)]
enum DeploymentCommand {
    /// Evaluate whether an artifact may be deployed under a policy id.
    Evaluate(DeploymentEvaluateCommand),
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to release-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Release decision recorded in a created attestation.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum DecisionArg {
    /// The release is allowed.
    Allow,
    /// The release is denied.
    Deny,
}

impl From<DecisionArg> for ReleaseDecision {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Allow => Self::Allow,
            DecisionArg::Deny => Self::Deny,
        }
    }
}

/// Arguments for `attestation create`.
#[derive(Args, Debug)]
struct AttestationCreateCommand {
    /// Subject name (unqualified artifact name).
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Subject digest as `<algorithm>:<hex>`; repeatable.
    #[arg(
        long = "digest",
        value_name = "ALG:HEX",
        required_unless_present = "file",
        conflicts_with = "file"
    )]
    digests: Vec<String>,
    /// Artifact file whose sha256 becomes the subject digest.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Identity of the attestation author.
    #[arg(long = "author-id", value_name = "ID")]
    author_id: String,
    /// Release decision.
    #[arg(long, value_enum)]
    decision: DecisionArg,
    /// Author version.
    #[arg(long = "author-version", value_name = "VERSION")]
    author_version: Option<String>,
    /// Environment the release is scoped to.
    #[arg(long, value_name = "ENV")]
    environment: Option<String>,
    /// SLSA build level property (ALLOW only).
    #[arg(long = "build-level", value_name = "LEVEL")]
    build_level: Option<u8>,
    /// Freeze environment and build level after they are set.
    #[arg(long = "safe-mode", action = ArgAction::SetTrue)]
    safe_mode: bool,
}

/// Arguments for `deployment evaluate`.
#[derive(Args, Debug)]
struct DeploymentEvaluateCommand {
    /// Shared config argument.
    #[command(flatten)]
    config: ConfigArgs,
    /// Policy id selecting the project rules.
    #[arg(long = "policy-id", value_name = "ID")]
    policy_id: String,
    /// Package name to deploy.
    #[arg(long, value_name = "NAME")]
    package: String,
    /// Artifact digest as `<algorithm>:<hex>`; repeatable.
    #[arg(long = "digest", value_name = "ALG:HEX", required = true)]
    digests: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
        Commands::Policy {
            command: PolicyCommand::Validate(args),
        } => command_policy_validate(&args),
        Commands::Attestation {
            command: AttestationCommand::Create(command),
        } => command_attestation_create(command),
        Commands::Deployment {
            command: DeploymentCommand::Evaluate(command),
        } => command_deployment_evaluate(&command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Config and Policy Commands
// ============================================================================

/// Loads configuration with a localized error.
fn load_config(args: &ConfigArgs) -> CliResult<ReleaseGateConfig> {
    ReleaseGateConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Executes the config validation command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = load_config(args)?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the policy validation command.
fn command_policy_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let policy = config
        .load_deployment_policy(None)
        .map_err(|err| CliError::new(t!("policy.load_failed", error = err)))?;
    let organization = policy.organization();
    write_stdout_line(&t!(
        "policy.validate.ok",
        roots = organization.releasers().len(),
        policies = policy.projects().len(),
        level = organization.min_build_level()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Attestation Commands
// ============================================================================

/// Executes the attestation creation command.
fn command_attestation_create(command: AttestationCreateCommand) -> CliResult<ExitCode> {
    let digests = match &command.file {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                CliError::new(t!(
                    "input.read_failed",
                    kind = t!("input.kind.artifact"),
                    path = path.display(),
                    error = err
                ))
            })?;
            DigestSet::of_reader(file).map_err(|err| {
                CliError::new(t!(
                    "input.read_failed",
                    kind = t!("input.kind.artifact"),
                    path = path.display(),
                    error = err
                ))
            })?
        }
        None => parse_digests(&command.digests)?,
    };

    let mut options = Vec::new();
    if let Some(version) = command.author_version {
        options.push(CreationOption::AuthorVersion(version));
    }
    if let Some(environment) = command.environment {
        options.push(CreationOption::Environment(environment));
    }
    if let Some(level) = command.build_level {
        options.push(CreationOption::SlsaBuildLevel(level));
    }
    if command.safe_mode {
        options.push(CreationOption::SafeMode);
    }

    let creation = Creation::new(
        Subject::new(command.name, digests),
        command.author_id,
        command.decision.into(),
        options,
    )
    .map_err(|err| CliError::new(t!("attestation.create_failed", error = err)))?;
    let mut bytes = creation
        .to_bytes()
        .map_err(|err| CliError::new(t!("attestation.create_failed", error = err)))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Deployment Commands
// ============================================================================

/// Executes the deployment evaluation command.
fn command_deployment_evaluate(command: &DeploymentEvaluateCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let digests = parse_digests(&command.digests)?;
    let Some(bundles_dir) = config.bundles_dir() else {
        return Err(CliError::new(t!("deployment.bundles_dir_missing")));
    };
    let policy = config
        .load_deployment_policy(None)
        .map_err(|err| CliError::new(t!("policy.load_failed", error = err)))?;
    let audit = config
        .build_audit_sink()
        .map_err(|err| CliError::new(t!("deployment.audit_failed", error = err)))?;
    let signatures = BundleDirectoryVerifier::new(bundles_dir, config.policy.max_document_bytes);
    let gate = DeploymentGate::new(policy, ReleaseVerifier::new(signatures), audit);

    let protection = gate
        .evaluate(&digests, &command.package, &PolicyId::new(command.policy_id.as_str()))
        .map_err(|err| CliError::new(t!("deployment.denied", error = err)))?;
    write_canonical_json(&protection, &t!("deployment.kind.protection"))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Parses repeated `<algorithm>:<hex>` arguments into a digest set.
fn parse_digests(values: &[String]) -> CliResult<DigestSet> {
    let mut entries = Vec::with_capacity(values.len());
    for value in values {
        let Some((algorithm, hex)) = value.split_once(':') else {
            return Err(CliError::new(t!("digest.malformed", value = value)));
        };
        entries.push((algorithm.to_string(), hex.to_string()));
    }
    DigestSet::new(entries).map_err(|err| CliError::new(t!("digest.invalid", error = err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes canonical JSON to stdout.
fn write_canonical_json<T: Serialize>(value: &T, kind: &str) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(t!("output.serialize_failed", kind = kind, error = err)))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
