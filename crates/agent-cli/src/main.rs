//! Market query CLI
//!
//! Answers stock or crypto questions with the supervisor/worker
//! orchestrator, either once (`ask`) or in an interactive session (`chat`).
//!
//! # Usage
//!
//! ```bash
//! export ANTHROPIC_API_KEY=...
//! export FINNHUB_API_KEY=...   # optional, stock news sentiment
//! export TAVILY_API_KEY=...    # optional, web research
//!
//! market-agent ask "What is the price of BTC?" --domain crypto
//! market-agent --domain stock chat
//! ```

mod progress;
mod render;

use agent_core::Error;
use agent_llm::providers::AnthropicProvider;
use agent_market::{ClassifierKind, Domain, MarketConfig, MarketServices};
use agent_tools::ToolExecution;
use agent_utils::{LogFormat, init_tracing};
use agent_workflow::{Orchestrator, OrchestratorConfig, RunReport};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use progress::ProgressPrinter;

#[derive(Parser, Debug)]
#[command(name = "market-agent", version)]
#[command(about = "Answer stock and crypto questions with a team of analyst agents")]
struct Cli {
    /// Asset class the questions are about
    #[arg(short, long, global = true, default_value = "stock", env = "MARKET_DOMAIN")]
    domain: Domain,

    /// Worker visits allowed per question
    #[arg(long, global = true)]
    max_visits: Option<usize>,

    /// Model used for routing, reasoning and synthesis
    #[arg(long, global = true)]
    model: Option<String>,

    /// How the supervisor picks the next worker
    #[arg(long, global = true, value_enum, default_value_t = RouterArg::Llm)]
    router: RouterArg,

    /// Run a worker's tool calls one after another
    #[arg(long, global = true)]
    sequential_tools: bool,

    /// Print the collected data table after each answer
    #[arg(long, global = true)]
    show_data: bool,

    /// Hide per-step progress on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single question and exit
    Ask {
        /// The question, in English or Chinese
        query: String,
    },
    /// Interactive session, one question per line
    Chat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum RouterArg {
    /// Model-backed classification
    Llm,
    /// Offline keyword rules
    Keyword,
}

impl From<RouterArg> for ClassifierKind {
    fn from(arg: RouterArg) -> Self {
        match arg {
            RouterArg::Llm => Self::Llm,
            RouterArg::Keyword => Self::Keyword,
        }
    }
}

impl Cli {
    /// Environment settings overridden by command-line flags
    fn orchestrator_config(&self) -> anyhow::Result<OrchestratorConfig> {
        let mut config = OrchestratorConfig::from_env()?;
        if let Some(max_visits) = self.max_visits {
            config.max_visits = max_visits;
        }
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if self.sequential_tools {
            config.tool_execution = ToolExecution::Sequential;
        }
        config.validate()?;
        Ok(config)
    }

    fn build(&self, domain: Domain, services: &MarketServices) -> anyhow::Result<Orchestrator> {
        let provider = Arc::new(AnthropicProvider::from_env()?);
        let mut builder =
            domain.builder(provider, services, self.orchestrator_config()?, self.router.into())?;
        if !self.quiet {
            builder = builder.event_handler(Arc::new(ProgressPrinter::new()));
        }
        Ok(builder.build()?)
    }
}

/// Run one question; Ctrl-C cancels it
async fn answer(orchestrator: &Orchestrator, query: &str) -> agent_core::Result<RunReport> {
    let token = CancellationToken::new();
    let run = orchestrator.run_report_with_cancellation(query, token.clone());
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result,
        _ = tokio::signal::ctrl_c() => {
            debug!("Interrupt received, cancelling run");
            token.cancel();
            run.await
        }
    }
}

fn print_report(report: &RunReport, show_data: bool) {
    println!("{}", report.answer);
    if show_data {
        println!();
        println!("{}", render::data_table(&report.state));
        if report.forced_finish {
            println!("(visit limit reached before the supervisor finished)");
        }
    }
}

async fn ask(cli: &Cli, services: &MarketServices, query: &str) -> anyhow::Result<ExitCode> {
    let orchestrator = cli.build(cli.domain, services)?;
    match answer(&orchestrator, query).await {
        Ok(report) => {
            print_report(&report, cli.show_data);
            Ok(ExitCode::SUCCESS)
        }
        Err(Error::Cancelled) => {
            eprintln!("Cancelled.");
            Ok(ExitCode::from(130))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_help() {
    println!("Ask a question in English or Chinese, for example:");
    println!("  What is the price of BTC?");
    println!("  分析一下特斯拉的前景");
    println!();
    println!("Commands:");
    println!("  /domain stock|crypto  switch asset class");
    println!("  /help                 show this help");
    println!("  /exit                 quit");
    println!();
}

async fn chat(cli: &Cli, services: &MarketServices) -> anyhow::Result<ExitCode> {
    let mut domain = cli.domain;
    let mut orchestrator = cli.build(domain, services)?;
    print_help();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{domain}> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => continue,
            ("/exit" | "/quit", _) => break,
            ("/help", _) => print_help(),
            ("/domain", arg) => match arg.parse::<Domain>() {
                Ok(next) => {
                    domain = next;
                    orchestrator = cli.build(domain, services)?;
                    println!("Switched to {domain}.");
                }
                Err(e) => eprintln!("{e}"),
            },
            _ => {
                match answer(&orchestrator, line).await {
                    Ok(report) => {
                        print_report(&report, cli.show_data);
                        println!();
                    }
                    Err(Error::Cancelled) => eprintln!("Cancelled."),
                    Err(e) => eprintln!("Error: {e}\n"),
                }
                services.cache.evict_expired().await;
            }
        }
    }

    println!("Goodbye!");
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let services = MarketServices::from_config(MarketConfig::from_env()?)?;
    info!(domain = %cli.domain, router = ?cli.router, "Starting market agent");

    match &cli.command {
        Command::Ask { query } => ask(&cli, &services, query).await,
        Command::Chat => chat(&cli, &services).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_arguments() {
        let cli = Cli::try_parse_from([
            "market-agent",
            "ask",
            "What is the price of BTC?",
            "--domain",
            "crypto",
            "--router",
            "keyword",
            "--max-visits",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.domain, Domain::Crypto);
        assert_eq!(cli.router, RouterArg::Keyword);
        assert_eq!(cli.max_visits, Some(2));
        let Command::Ask { query } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(query, "What is the price of BTC?");
    }

    #[test]
    fn test_unknown_domain_rejected() {
        let result = Cli::try_parse_from(["market-agent", "--domain", "forex", "chat"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_router_maps_to_classifier() {
        assert_eq!(ClassifierKind::from(RouterArg::Keyword), ClassifierKind::Keyword);
        assert_eq!(ClassifierKind::from(RouterArg::Llm), ClassifierKind::Llm);
    }
}
