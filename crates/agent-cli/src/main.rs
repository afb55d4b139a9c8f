//! multi-agent
//!
//! Terminal front end: an orchestrator that answers directly, calls local
//! tools, or hands the question to one of four expert agents.

mod app;

use std::io::Write as _;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::GenerationOptions;
use agent_runtime::{ProviderConfig, ProviderKind};
use expert_panel::PanelOptions;

use crate::app::{App, Outcome, DEMO_QUESTIONS};

#[derive(Parser, Debug)]
#[command(name = "multi-agent", author, version, about = "Multi-agent assistant with tools and expert delegation")]
struct Args {
    /// LLM provider (openai or gemini)
    #[arg(short, long, env = "LLM_PROVIDER")]
    provider: Option<ProviderKind>,

    /// Model override; the provider default when unset
    #[arg(short, long, env = "LLM_MODEL")]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Upper bound on model calls per question, for every agent
    #[arg(long, env = "AGENT_MAX_ITERATIONS", default_value_t = agent_core::reasoning::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat interactively (default)
    Chat,
    /// Run the example questions one after another
    Demo,
}

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr so they do not interleave with answers
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,agent_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ProviderConfig::from_env_for(args.provider)
        .context("Could not configure the LLM provider; set its API key in the environment or a .env file")?;
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }

    let client = agent_runtime::create_client(&config)?;
    let options = PanelOptions {
        generation: GenerationOptions {
            temperature: args.temperature,
            ..GenerationOptions::default()
        },
        max_iterations: args.max_iterations,
    };
    let orchestrator = expert_panel::standard_orchestrator(client, &options)?;

    let mut app = App::new(orchestrator, config.kind);
    println!("{}", app.banner());

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    match args.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&mut app, &mut input).await,
        Command::Demo => run_demo(&mut app, &mut input).await,
    }
}

async fn run_chat(app: &mut App, input: &mut InputLines) -> anyhow::Result<()> {
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        // EOF ends the session like an exit word
        let Some(line) = input.next_line().await? else {
            println!();
            break;
        };

        match app.handle_line(&line).await {
            Outcome::Exit => break,
            Outcome::Skip => {}
            Outcome::Reset => println!("Conversation cleared."),
            Outcome::Reply(reply) => println!("\nAssistant: {reply}"),
            Outcome::Failed(message) => println!("\nError: {message}"),
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn run_demo(app: &mut App, input: &mut InputLines) -> anyhow::Result<()> {
    for (i, question) in DEMO_QUESTIONS.iter().enumerate() {
        println!("\n[{}/{}] You: {question}", i + 1, DEMO_QUESTIONS.len());

        match app.handle_line(question).await {
            Outcome::Reply(reply) => println!("\nAssistant: {reply}"),
            Outcome::Failed(message) => println!("\nError: {message}"),
            Outcome::Exit | Outcome::Skip | Outcome::Reset => {}
        }

        if i + 1 < DEMO_QUESTIONS.len() {
            print!("\nPress Enter to continue...");
            std::io::stdout().flush()?;
            if input.next_line().await?.is_none() {
                println!();
            }
        }
    }
    Ok(())
}
