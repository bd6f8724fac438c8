//! CLI entry point for `wpai`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dotenvy::dotenv;
use serde_json::Value;

use wpai_commands::commands::{
    CommandDetector, CommandSanitizer, CommandSecurity, Detect, Sanitize, SecurityCheck,
    SecurityVerdict,
};
use wpai_commands::config::Config;
use wpai_commands::logging;
use wpai_commands::site::InMemorySite;
use wpai_commands::tools::{ToolContext, ToolRegistryBuilder};
use wpai_commands::{CommandHandler, ExecutionResult, Parameters};

#[derive(Parser, Debug)]
#[command(
    name = "wpai",
    author,
    version,
    about = "Run WordPress site commands the way the site assistant does",
    after_help = "Examples:\
    \n   wpai ask \"which plugins are active?\"\
    \n   wpai exec \"wp plugin list\" --param status=inactive\
    \n   wpai check \"wp db drop --yes\"\
    \n   wpai --site fixture.toml exec \"wp core version\""
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Site fixture (TOML) backing the WordPress API
    #[arg(long, global = true)]
    site: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the raw result as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Ask a plain-language question about the site
    Ask {
        /// The question, e.g. "what PHP version is running?"
        message: String,
    },
    /// Run an explicit `wp` or `php` command
    Exec {
        /// The command, e.g. "wp plugin list"
        command: String,
        /// Extra parameter as key=value (repeatable)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Output format: json or array
        #[arg(long)]
        format: Option<String>,
    },
    /// Show how a command is sanitized and whether it would be blocked
    Check {
        command: String,
    },
    /// Show which command a message maps to
    Detect {
        message: String,
    },
    /// List the agent tool definitions
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    match cli.command.clone() {
        Commands::Check { command } => run_check(&command),
        Commands::Detect { message } => run_detect(&message, cli.global.json),
        Commands::Tools => run_tools(&cli.global),
        Commands::Ask { message } => {
            let handler = build_handler(&cli.global)?;
            let result = tokio::task::spawn_blocking(move || {
                handler.process_request(&message, Parameters::new())
            })
            .await
            .context("Failed to run request")?;
            print_result(&result, cli.global.json)
        }
        Commands::Exec {
            command,
            params,
            format,
        } => {
            let mut parameters = parse_params(&params)?;
            if let Some(format) = format {
                parameters.insert("format".to_string(), Value::String(format));
            }
            let handler = build_handler(&cli.global)?;
            let result =
                tokio::task::spawn_blocking(move || handler.execute_command(command, parameters))
                    .await
                    .context("Failed to run command")?;
            print_result(&result, cli.global.json)
        }
    }
}

// === Setup ===

fn load_site(global: &GlobalArgs, config: &Config) -> Result<Arc<InMemorySite>> {
    let fixture = global.site.clone().or_else(|| config.site_fixture());
    let site = match fixture {
        Some(path) => InMemorySite::from_path(&path)
            .with_context(|| format!("Failed to load site fixture: {}", path.display()))?,
        None => InMemorySite::sample(),
    };
    Ok(Arc::new(site))
}

fn build_handler(global: &GlobalArgs) -> Result<Arc<CommandHandler>> {
    let config = Config::load(global.config.clone())?;
    let site = load_site(global, &config)?;
    let handler = CommandHandler::builder(site.clone())
        .activity_log(site)
        .runner(Arc::new(config.runner()))
        .settings(config.executor_settings())
        .build();
    Ok(Arc::new(handler))
}

/// Parse repeated `key=value` pairs. Integers and booleans keep their type.
fn parse_params(pairs: &[String]) -> Result<Parameters> {
    let mut parameters = Parameters::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid parameter '{pair}': expected KEY=VALUE"))?;
        let value = if let Ok(n) = value.parse::<u64>() {
            Value::from(n)
        } else if let Ok(b) = value.parse::<bool>() {
            Value::Bool(b)
        } else {
            Value::String(value.to_string())
        };
        parameters.insert(key.trim().to_string(), value);
    }
    Ok(parameters)
}

// === Subcommands ===

fn print_result(result: &ExecutionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let method = result
        .method
        .map_or("-", |m| match m {
            wpai_commands::ExecutionMethod::Shell => "shell",
            wpai_commands::ExecutionMethod::WpApi => "wp_api",
        });
    let status = if result.success {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("{} {} {}", status, result.command.bold(), format!("[{method}]").dimmed());
    if logging::is_verbose() {
        let kind = result.command_type.as_deref().unwrap_or("-");
        let code = result
            .return_code
            .map_or_else(|| "-".to_string(), |code| code.to_string());
        println!("{}", format!("type={kind} exit={code}").dimmed());
    }
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    if let Some(error) = &result.error {
        eprintln!("{} {}", "error:".red().bold(), error);
    }
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(command: &str) -> Result<()> {
    let sanitizer = CommandSanitizer::new().context("Failed to build sanitizer")?;
    let security = CommandSecurity::new().context("Failed to build security filter")?;

    let sanitized = sanitizer.sanitize(command);
    println!("{} {}", "Sanitized:".bold(), sanitized);
    println!(
        "{} {}",
        "Logged as:".bold(),
        security.get_safe_command_for_logging(&sanitized)
    );
    for (label, candidate) in [("raw", command), ("sanitized", sanitized.as_str())] {
        match security.check(candidate) {
            SecurityVerdict::Safe => println!("  {} {label} command is allowed", "✓".green()),
            SecurityVerdict::Dangerous { rule } => println!(
                "  {} {label} command is blocked (rule: {})",
                "✗".red(),
                rule.yellow()
            ),
        }
    }
    Ok(())
}

fn run_detect(message: &str, json: bool) -> Result<()> {
    let detector = CommandDetector::new().context("Failed to build detector")?;
    match detector.detect_command(message) {
        Some(detected) if json => println!("{}", serde_json::to_string_pretty(&detected)?),
        Some(detected) => {
            println!("{} {}", detected.kind.as_str().cyan().bold(), detected.command);
            if !detected.parameters.is_empty() {
                println!("  parameters: {}", Value::Object(detected.parameters));
            }
        }
        None => println!("{}", "No command detected".yellow()),
    }
    Ok(())
}

fn run_tools(global: &GlobalArgs) -> Result<()> {
    let handler = build_handler(global)?;
    let registry = ToolRegistryBuilder::new()
        .with_command_tools(handler)
        .build(ToolContext::new());
    println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_keeps_types() {
        let params = parse_params(&[
            "timeout=20".to_string(),
            "status=active".to_string(),
            "dry=true".to_string(),
        ])
        .unwrap();
        assert_eq!(params["timeout"], Value::from(20u64));
        assert_eq!(params["status"], Value::from("active"));
        assert_eq!(params["dry"], Value::Bool(true));
        assert!(parse_params(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_exec() {
        let cli = Cli::try_parse_from([
            "wpai", "exec", "wp plugin list", "--param", "status=active", "--json",
        ])
        .unwrap();
        assert!(cli.global.json);
        assert!(matches!(cli.command, Commands::Exec { ref params, .. } if params.len() == 1));
    }
}
