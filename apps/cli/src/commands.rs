//! CLI command definitions, routing, and tracing setup.

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use curriculum_core::{Pipeline, PipelineConfig, ProgressReporter, RunOutput, RunRequest, Stage};
use curriculum_markdown::render_topic;
use curriculum_reasoning::OpenAiClient;
use curriculum_shared::{
    AppConfig, IssueCreationResult, LinkStatus, init_config, load_config,
    resolve_reasoning_settings, resolve_tracker_settings,
};
use curriculum_tracker::GitHubClient;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Curriculum builder: turn a learning request into a structured curriculum.
#[derive(Parser)]
#[command(
    name = "curriculum",
    version,
    about = "Turn a learning-request issue into a curriculum and, optionally, tracker issues.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build a curriculum for one issue and optionally publish it.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Title of the learning-request issue (the topic to learn).
    #[arg(long)]
    pub issue_title: String,

    /// Body of the issue (what the learner already knows).
    #[arg(long)]
    pub issue_body: String,

    /// Formatting directive for the Markdown rewrite.
    #[arg(long)]
    pub style_guide: Option<String>,

    /// Publish the curriculum as tracker issues.
    #[arg(long)]
    pub publish: bool,

    /// Repository owner to publish into.
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name to publish into.
    #[arg(long)]
    pub repo: Option<String>,

    /// Actually create issues. Without it, publishing is previewed only.
    #[arg(long)]
    pub no_dry_run: bool,

    /// Override `defaults.subtopic_cap`.
    #[arg(long)]
    pub subtopic_cap: Option<usize>,

    /// Override `reasoning.model`.
    #[arg(long)]
    pub model: Option<String>,

    /// Print the run result as JSON instead of Markdown.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout
/// carries only the curriculum.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "curriculum=info",
        1 => "curriculum=debug",
        _ => "curriculum=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(cap) = args.subtopic_cap {
        config.defaults.subtopic_cap = cap;
    }
    if let Some(model) = args.model {
        config.reasoning.model = model;
    }

    let reasoning = OpenAiClient::new(&resolve_reasoning_settings(&config)?)?;

    // Credentials are only needed when issues will really be created.
    let tracker = if args.publish && args.no_dry_run {
        Some(GitHubClient::new(&resolve_tracker_settings(&config)?)?)
    } else {
        None
    };

    let request = RunRequest {
        issue_title: args.issue_title,
        issue_body: args.issue_body,
        style_guide: args.style_guide,
        owner: args.owner,
        repo: args.repo,
        publish: args.publish,
        dry_run: !args.no_dry_run,
    };

    info!(
        title = %request.issue_title,
        model = %config.reasoning.model,
        publish = request.publish,
        dry_run = request.dry_run,
        "building curriculum"
    );

    let pipeline = Pipeline::new(reasoning, tracker, PipelineConfig::from(&config));
    let reporter = CliProgress::new();
    let output = pipeline
        .run(&request, &reporter)
        .await
        .inspect_err(|_| reporter.spinner.abandon())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", render_topic(&output.topic, &config.defaults.code_language));
    if let Some(issues) = &output.issues {
        print_issue_summary(issues);
    }
    eprintln!(
        "\n  Run {} finished in {:.1}s",
        output.run_id,
        output.elapsed.as_secs_f64()
    );

    Ok(())
}

fn print_issue_summary(result: &IssueCreationResult) {
    println!();
    if result.topic_issue.is_placeholder() {
        println!("  Dry run: no issues were created. Pass --no-dry-run to publish.");
        println!("  Topic:    {}", result.topic_issue.title);
        for issue in &result.sub_issues {
            println!("  Subtopic: {}", issue.title);
        }
        return;
    }

    println!("  Topic issue: {}", result.topic_issue.url);
    for (issue, link) in result.sub_issues.iter().zip(&result.links) {
        let note = match &link.status {
            LinkStatus::Linked => String::new(),
            LinkStatus::Skipped => " (not linked)".to_string(),
            LinkStatus::Failed { error } => format!(" (link failed: {error})"),
        };
        println!("  Sub-issue:   {}{note}", issue.url);
    }

    let failed = result.failed_links().count();
    if failed > 0 {
        println!("  {failed} sub-issue link(s) failed; the issues exist but are not attached.");
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: Stage) {
        self.spinner.set_message(stage.label());
    }

    fn subtopic_enriched(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Building curriculum [{current}/{total}] {name}"));
    }

    fn done(&self, _output: &RunOutput) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_issue_title_and_body() {
        let missing_body = Cli::try_parse_from(["curriculum", "run", "--issue-title", "graph theory"]);
        assert!(missing_body.is_err());

        let cli = Cli::try_parse_from([
            "curriculum",
            "run",
            "--issue-title",
            "graph theory",
            "--issue-body",
            "basic recursion",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.issue_body, "basic recursion");
                assert!(!args.no_dry_run);
            }
            Command::Config { .. } => panic!("expected run"),
        }
    }
}
