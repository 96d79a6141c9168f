mod config;
mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use controller::Request;
use controller::convention::{model_name_for, sentinel_name_for};
use policy::Value;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "sentinel.toml";

/// Exit code when the request is denied.
const DENIED: u8 = 2;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Inspect declarative controller access control", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize one request against a configured controller
    Check {
        /// Controller name, e.g. UsersController
        controller: String,
        /// Action name, e.g. index
        action: String,
        /// Accept header used to pick the response format
        #[arg(long, default_value = "text/html")]
        accept: String,
        /// Current user as JSON
        #[arg(short, long)]
        user: Option<String>,
        /// Assigned request value as name=JSON (repeatable)
        #[arg(short, long = "assign")]
        assigns: Vec<String>,
    },
    /// List the guards of a configured controller
    Guards {
        /// Controller name
        controller: String,
    },
    /// Show the model and sentinel names derived from a controller name
    Names {
        /// Controller name
        controller: String,
    },
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            controller,
            action,
            accept,
            user,
            assigns,
        } => cmd_check(&cli.config, &controller, &action, &accept, user.as_deref(), &assigns),
        Commands::Guards { controller } => cmd_guards(&cli.config, &controller),
        Commands::Names { controller } => cmd_names(&controller),
    }
}

fn cmd_check(
    config_path: &Path,
    controller: &str,
    action: &str,
    accept: &str,
    user: Option<&str>,
    assigns: &[String],
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let registry = Arc::new(config.registry()?);
    let definition = config.controller(controller, registry)?;
    let halt = config
        .controller_config(controller)
        .is_some_and(|c| c.halt_on_render);

    let mut request = Request::new(action).accept(accept).halt_on_render(halt);
    if let Some(user) = user {
        request = request.user(parse_json("--user", user)?);
    }
    for assign in assigns {
        let (name, value) = parse_assign(assign)?;
        request = request.assign(name, value);
    }

    let outcome = definition.authorize(&mut request)?;

    println!("{controller}#{action}");
    if outcome.evaluations().is_empty() {
        println!("  no guards apply");
    }
    for evaluation in outcome.evaluations() {
        let filter = definition.guards()[evaluation.guard].filter().to_string();
        let verdict = match &evaluation.denied_with {
            None => "granted".to_string(),
            Some(handler) => format!("denied ({handler})"),
        };
        println!(
            "  #{:<3} {:<20}  {:<28}  {verdict}",
            evaluation.guard, evaluation.check, filter
        );
    }
    if outcome.halted() {
        println!("  (halted)");
    }

    match request.response() {
        Some(response) => {
            println!("response: {}", response.status);
            if !response.body.is_empty() {
                println!("body: {}", response.body);
            }
        }
        None => println!("response: none"),
    }

    if outcome.proceeds() {
        println!("action: runs");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("action: skipped");
        Ok(ExitCode::from(DENIED))
    }
}

fn cmd_guards(config_path: &Path, controller: &str) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let registry = Arc::new(config.registry()?);
    let definition = config.controller(controller, registry)?;

    match config.sentinel_for(controller) {
        Some(sentinel) => println!("{controller} (sentinel: {sentinel})"),
        None => println!("{controller}"),
    }

    if definition.guards().is_empty() {
        println!("  no guards");
        return Ok(ExitCode::SUCCESS);
    }

    for (index, guard) in definition.guards().iter().enumerate() {
        println!(
            "  #{:<3} {:<20}  {:<28}  denies with {}",
            index,
            guard.check().label(),
            guard.filter().to_string(),
            guard.denial_handler()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_names(controller: &str) -> Result<ExitCode> {
    println!("model:    {}", model_name_for(controller));
    println!("sentinel: {}", sentinel_name_for(controller));
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(Config::load(path)?)
}

fn parse_json(name: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|source| Error::InvalidJson {
        name: name.to_string(),
        source,
    })
}

fn parse_assign(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| Error::InvalidAssign(raw.to_string()))?;
    let name = name.trim();
    Ok((name.to_string(), parse_json(name, value)?))
}
