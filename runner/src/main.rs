//! Resumable agent loop that grows a markdown business plan.
//!
//! Each run picks up the plan document where the previous run left it, asks
//! the agent for the next chunk, appends it, and stops once the chunk looks
//! like the end of the plan.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use plan_runner::agents::build_plan_agent;
use plan_runner::io::config::{
    ConfigOverrides, DEFAULT_CONFIG_PATH, RunnerConfig, load_config, write_config,
};
use plan_runner::io::store::ContextStore;
use plan_runner::logging;
use plan_runner::looping::run_loop;
use plan_runner::report::run_report;
use plan_runner::step::{StepConfig, StepEvent, init_document, run_step};

#[derive(Parser)]
#[command(
    name = "plan-runner",
    version,
    about = "Resumable agent loop that writes a micro-SaaS business plan"
)]
struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, env = "PLAN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Show debug diagnostics on stderr when `RUST_LOG` is unset.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Model identifier.
    #[arg(long, global = true, env = "PLAN_MODEL")]
    model: Option<String>,

    /// Sampling temperature.
    #[arg(long, global = true, env = "PLAN_TEMPERATURE")]
    temperature: Option<f32>,

    /// Model calls allowed per agent invocation.
    #[arg(long, global = true, env = "PLAN_MAX_STEPS")]
    max_steps: Option<u32>,

    /// Results per internet search.
    #[arg(long, global = true, env = "PLAN_SEARCH_RESULTS")]
    search_results: Option<u32>,

    /// Plan document path.
    #[arg(long, global = true, env = "PLAN_DOCUMENT")]
    document: Option<PathBuf>,
}

impl OverrideArgs {
    fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            temperature: self.temperature,
            max_steps: self.max_steps,
            search_results: self.search_results,
            document: self.document.clone(),
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Loop until the plan looks finished (default).
    Run,
    /// Run a single iteration and report the verdict.
    Step,
    /// Seed the plan document with its title.
    Init {
        /// Also write the effective config if the config file is missing.
        #[arg(long)]
        write_config: bool,
    },
    /// Run the agent once and save the answer to the next free `reportN.md`.
    Report {
        /// Output directory (defaults to `report_dir` from config).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?
        .apply_overrides(&cli.overrides.to_overrides())
        .context("apply config overrides")?;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(&cfg),
        Command::Step => cmd_step(&cfg),
        Command::Init { write_config } => cmd_init(&cfg, &cli.config, write_config),
        Command::Report { dir } => cmd_report(&cfg, dir),
    }
}

fn cmd_run(cfg: &RunnerConfig) -> Result<()> {
    let agent = build_plan_agent(cfg, cfg.agent.max_steps)?;
    let store = ContextStore::new(&cfg.document_path);
    run_loop(&store, &agent, &StepConfig::from_config(cfg), print_event)?;
    println!("\n[DONE] Plan appears complete.");
    Ok(())
}

fn cmd_step(cfg: &RunnerConfig) -> Result<()> {
    let agent = build_plan_agent(cfg, cfg.agent.max_steps)?;
    let store = ContextStore::new(&cfg.document_path);
    let config = StepConfig::from_config(cfg);
    let mut on_event = print_event;
    let mut document = init_document(&store, &config, &mut on_event)?;
    let outcome = run_step(&store, &mut document, &agent, &config, 1, &mut on_event)?;
    if outcome.verdict.is_finished() {
        println!("\n[DONE] Plan appears complete.");
    }
    Ok(())
}

fn cmd_init(cfg: &RunnerConfig, config_path: &Path, write: bool) -> Result<()> {
    if write && !config_path.exists() {
        write_config(config_path, cfg)?;
        println!("Config written to {}", config_path.display());
    }
    let store = ContextStore::new(&cfg.document_path);
    init_document(&store, &StepConfig::from_config(cfg), &mut print_event)?;
    println!("Plan document ready at {}", store.path().display());
    Ok(())
}

fn cmd_report(cfg: &RunnerConfig, dir: Option<PathBuf>) -> Result<()> {
    let agent = build_plan_agent(cfg, cfg.agent.report_max_steps)?;
    let dir = dir.unwrap_or_else(|| cfg.report_dir.clone());
    let path = run_report(&agent, &dir)?;
    println!("Output saved to {}", path.display());
    Ok(())
}

fn print_event(event: &StepEvent) {
    match event {
        StepEvent::Seeded => println!("[INIT] Seeded empty plan with its title."),
        StepEvent::Resuming {
            scratchpad_chars, ..
        } => println!("\n[CONTINUING] Resuming with scratchpad length: {scratchpad_chars}"),
        StepEvent::Checkpoint(outcome) if !outcome.verdict.is_finished() => {
            println!("\n[LOOP] Checkpoint saved. Restarting agent...\n");
        }
        StepEvent::Checkpoint(_) => {}
    }
}
