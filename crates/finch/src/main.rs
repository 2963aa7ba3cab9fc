use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finch_engine::selector::{base_sampling_params, parse_strategy};
use finch_models::{FinchConfig, PromptStrategy, UserLevel};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "finch", about = "Financial Insight & Chat Harness")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/finch.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one analysis strategy for a symbol and query
    Analyze {
        /// Strategy endpoint, e.g. one-shot-analysis
        #[arg(short, long)]
        strategy: String,

        #[arg(short = 'S', long)]
        symbol: String,

        #[arg(short, long)]
        query: String,

        /// beginner, general, or advanced
        #[arg(long, default_value = "general")]
        user_level: String,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Send one chat message
    Chat {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        message: String,

        /// Conversation to append to; a fresh one is created when omitted
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Activate a session mode (stock-search, portfolio-review,
    /// market-analysis, news-update)
    QuickAction {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        action: String,
    },
    /// Run the evaluation harness over the built-in dataset
    Eval {
        /// Write the full report here instead of the configured report dir
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List every strategy with its fixed sampling parameters
    Strategies,
}

fn parse_user_level(value: &str) -> Result<UserLevel> {
    match value {
        "beginner" => Ok(UserLevel::Beginner),
        "general" => Ok(UserLevel::General),
        "advanced" => Ok(UserLevel::Advanced),
        other => anyhow::bail!("unknown user level: {other} (expected beginner/general/advanced)"),
    }
}

fn load_config(path: &str) -> Result<FinchConfig> {
    if !std::path::Path::new(path).exists() {
        return Ok(FinchConfig::default());
    }
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| "Failed to parse config")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    info!(path = %cli.config, model = %config.model.analysis_model, "Configuration loaded");

    match cli.command {
        Command::Analyze {
            strategy,
            symbol,
            query,
            user_level,
            pretty,
        } => {
            let strategy = parse_strategy(&strategy)
                .map_err(|e| anyhow::anyhow!("Invalid strategy: {e}"))?;
            let user_level = parse_user_level(&user_level)?;

            let analyzer = finch::build_analyzer(&config);
            let analysis = analyzer
                .analyze(strategy, &symbol, &query, user_level)
                .await
                .map_err(|e| anyhow::anyhow!("Analysis failed: {e}"))?;

            let output = serde_json::json!({
                "result": analysis.result,
                "method": analysis.method,
                "used_fallback": analysis.used_fallback,
                "token_usage": analysis.token_usage,
            });
            print_json(&output, pretty)?;
        }
        Command::Chat {
            user,
            message,
            conversation,
        } => {
            let conversation_id =
                conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let assistant =
                finch::build_assistant(&config).context("Failed to open conversation store")?;

            let reply = assistant
                .chat(&user, &conversation_id, &message)
                .await
                .map_err(|e| anyhow::anyhow!("Chat failed: {e}"))?;

            let output = serde_json::json!({
                "response": reply.response,
                "conversation_id": reply.conversation_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            print_json(&output, true)?;
        }
        Command::QuickAction { user, action } => {
            let assistant =
                finch::build_assistant(&config).context("Failed to open conversation store")?;
            let response = assistant
                .quick_action(&user, &action)
                .map_err(|e| anyhow::anyhow!("Quick action failed: {e}"))?;
            print_json(&serde_json::json!({ "response": response }), true)?;
        }
        Command::Eval { output } => {
            let harness = finch::build_harness(&config);
            let cases = finch_engine::builtin_test_cases();
            info!(cases = cases.len(), judge = %config.model.judge_model, "Starting evaluation run");
            let report = harness.run(&cases).await;

            let path = match output {
                Some(path) => std::path::PathBuf::from(path),
                None => {
                    std::fs::create_dir_all(&config.eval.report_dir).with_context(|| {
                        format!("Failed to create report dir: {}", config.eval.report_dir)
                    })?;
                    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
                    std::path::PathBuf::from(&config.eval.report_dir)
                        .join(format!("evaluation_report_{stamp}.json"))
                }
            };
            std::fs::write(&path, serde_json::to_string_pretty(&report)?)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            eprintln!("Report written to {}", path.display());

            print_json(&serde_json::to_value(&report.summary)?, true)?;
        }
        Command::Strategies => {
            let strategies: Vec<serde_json::Value> = PromptStrategy::ALL
                .into_iter()
                .map(|strategy| {
                    let params = base_sampling_params(strategy);
                    serde_json::json!({
                        "endpoint": strategy.endpoint(),
                        "temperature": params.temperature,
                        "top_p": params.top_p,
                        "top_k": params.top_k,
                        "max_output_tokens": params.max_output_tokens,
                    })
                })
                .collect();
            print_json(&serde_json::json!({ "strategies": strategies }), true)?;
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}
