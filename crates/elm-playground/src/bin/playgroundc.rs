/// Elm playground compiler CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use elm_playground::{CompileOutcome, Playground, PlaygroundConfig, SlotContent, classify};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "playgroundc")]
#[command(about = "Compile Elm playground snippets into one renderable module per expression")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Scratch workspace directory (overrides the configuration)
    #[arg(short, long, value_name = "DIR", global = true)]
    workspace: Option<PathBuf>,

    /// Compiler executable (overrides the configuration)
    #[arg(long, value_name = "PATH", global = true)]
    compiler: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the primary module and every playground expression
    Compile {
        /// The user's primary code
        #[arg(long, value_name = "FILE")]
        primary: Option<PathBuf>,

        /// Playground snippet buffer
        #[arg(long, value_name = "FILE")]
        playground: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Clean the workspace after compiling
        #[arg(long)]
        clean: bool,
    },
    /// Remove generated sources and artifacts from the workspace
    Clean,
    /// Print the classified statements of a playground buffer
    Classify {
        #[arg(long, value_name = "FILE")]
        playground: PathBuf,
    },
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_config(args: &Args) -> anyhow::Result<PlaygroundConfig> {
    let mut config = match &args.config {
        Some(path) => PlaygroundConfig::from_file(path)?,
        None => PlaygroundConfig::default(),
    };
    if let Some(workspace) = &args.workspace {
        config.workspace_dir = workspace.clone();
    }
    if let Some(compiler) = &args.compiler {
        config.compiler.program = compiler.clone();
    }
    Ok(config)
}

fn print_outcome(outcome: &CompileOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        CompileOutcome::Rendered(slots) => {
            for slot in slots {
                match &slot.content {
                    SlotContent::Component(component) => {
                        println!("[{}] {} -> {}", slot.index, slot.expression, component.entry)
                    }
                    SlotContent::Placeholder => println!("[{}] {} -> (empty)", slot.index, slot.expression),
                }
            }
        }
        CompileOutcome::Diagnostic(diagnostic) => eprintln!("{}", diagnostic),
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = load_config(&args)?;

    match &args.command {
        Command::Compile {
            primary,
            playground,
            json,
            clean,
        } => {
            let primary_code = match primary {
                Some(path) => read(path)?,
                None => String::new(),
            };
            let playground_code = read(playground)?;

            let compiler = Playground::new(config);
            let outcome = compiler.compile(&primary_code, &playground_code).await?;
            print_outcome(&outcome, *json)?;

            if *clean {
                compiler.clean_up().await;
            }
            Ok(matches!(outcome, CompileOutcome::Rendered(_)))
        }
        Command::Clean => {
            let report = Playground::new(config).clean().await?;
            if args.verbose {
                println!("Removed {} files ({} failed)", report.removed, report.failed);
            }
            // files that could not be removed are logged, not fatal
            Ok(true)
        }
        Command::Classify { playground } => {
            let statements = classify(&read(playground)?);
            println!("{}", serde_json::to_string_pretty(&statements)?);
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("playgroundc failed: {:#}", e);
            process::exit(1);
        }
    }
}
