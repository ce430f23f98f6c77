mod config;
mod demo_cmd;
mod generate_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use studyplan_core::{InferenceConfig, LearningPlanService};

use config::StudyplanConfig;
use generate_cmd::RequestSource;

#[derive(Parser)]
#[command(
    name = "studyplan",
    version,
    about = "Generate personalised learning plans with AWS Bedrock"
)]
struct Cli {
    /// AWS region (overrides STUDYPLAN_REGION env var)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Bedrock model identifier (overrides STUDYPLAN_MODEL_ID env var)
    #[arg(long, global = true)]
    model_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a studyplan config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a learning plan and print it as JSON
    Generate {
        /// Subject to learn
        #[arg(long, required_unless_present = "input", conflicts_with = "input")]
        topic: Option<String>,
        /// Current knowledge level (e.g. beginner)
        #[arg(long, required_unless_present = "input", conflicts_with = "input")]
        level: Option<String>,
        /// Hours available per week
        #[arg(long, required_unless_present = "input", conflicts_with = "input")]
        hours: Option<u32>,
        /// Preferred ways of learning (e.g. "reading, projects")
        #[arg(long, required_unless_present = "input", conflicts_with = "input")]
        preferences: Option<String>,
        /// Read the request from a JSON file instead of flags
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write the plan to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a plan for a fixed sample learner and print a summary
    Demo,
    /// Serve the learning plan HTTP API
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Execute the `studyplan init` command: write config file.
fn cmd_init(region: Option<&str>, model_id: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    if let Some(region) = region {
        cfg.bedrock.region = region.to_string();
    }
    if let Some(model_id) = model_id {
        cfg.bedrock.model_id = model_id.to_string();
    }

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  bedrock.region = {}", cfg.bedrock.region);
    println!("  bedrock.model_id = {}", cfg.bedrock.model_id);
    println!();
    println!("AWS credentials are read from the standard AWS provider chain.");

    Ok(())
}

/// Resolve configuration and build a Bedrock-backed service.
async fn connect(region: Option<&str>, model_id: Option<&str>) -> anyhow::Result<LearningPlanService> {
    let resolved = StudyplanConfig::resolve(region, model_id)?;
    let inference: &InferenceConfig = &resolved.inference;
    tracing::debug!(region = %inference.region, model_id = %inference.model_id, "resolved configuration");
    LearningPlanService::connect(inference)
        .await
        .context("failed to initialize Bedrock client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let region = cli.region.as_deref();
    let model_id = cli.model_id.as_deref();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(region, model_id, force)?;
        }
        Commands::Generate {
            topic,
            level,
            hours,
            preferences,
            input,
            output,
        } => {
            let source = match (&input, &topic, &level, hours, &preferences) {
                (Some(path), ..) => RequestSource::File(path),
                (None, Some(topic), Some(level), Some(hours), Some(preferences)) => {
                    RequestSource::Flags {
                        topic,
                        level,
                        hours,
                        preferences,
                    }
                }
                _ => anyhow::bail!(
                    "either --input or all of --topic, --level, --hours, --preferences are required"
                ),
            };
            let request = generate_cmd::build_request(source)?;
            let service = connect(region, model_id).await?;
            generate_cmd::run_generate(&service, &request, output.as_deref()).await?;
        }
        Commands::Demo => {
            let service = connect(region, model_id).await?;
            demo_cmd::run_demo(&service).await?;
        }
        Commands::Serve { bind, port } => {
            let service = connect(region, model_id).await?;
            serve_cmd::run_serve(service, &bind, port).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studyplan", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_accepts_flags() {
        let cli = Cli::try_parse_from([
            "studyplan",
            "--region",
            "eu-west-1",
            "generate",
            "--topic",
            "Go",
            "--level",
            "beginner",
            "--hours",
            "5",
            "--preferences",
            "reading",
        ])
        .unwrap();
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        let Commands::Generate { topic, hours, .. } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(topic.as_deref(), Some("Go"));
        assert_eq!(hours, Some(5));
    }

    #[test]
    fn generate_accepts_input_file_alone() {
        let cli = Cli::try_parse_from(["studyplan", "generate", "--input", "req.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { input: Some(_), .. }));
    }

    #[test]
    fn generate_rejects_partial_flags() {
        assert!(Cli::try_parse_from(["studyplan", "generate", "--topic", "Go"]).is_err());
    }

    #[test]
    fn generate_rejects_input_mixed_with_flags() {
        assert!(
            Cli::try_parse_from([
                "studyplan", "generate", "--input", "req.json", "--topic", "Go"
            ])
            .is_err()
        );
    }

    #[test]
    fn global_model_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["studyplan", "demo", "--model-id", "anthropic.claude-v2:1"])
            .unwrap();
        assert_eq!(cli.model_id.as_deref(), Some("anthropic.claude-v2:1"));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["studyplan", "serve"]).unwrap();
        let Commands::Serve { bind, port } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(bind, "127.0.0.1");
        assert_eq!(port, 3000);
    }
}
