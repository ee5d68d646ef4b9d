mod render;

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use pfp_forge_contracts::chat::{parse_intent, CHAT_HELP_COMMANDS};
use pfp_forge_contracts::{SessionLog, StyleOption, ViewState};
use pfp_forge_engine::{ForgeConfig, ForgeController};
use serde_json::Value;
use tracing::info;

use crate::render::{
    describe_saved, generating_panel, history_list, result_card, save_image, style_selector,
    view_panel, MINTING_LABEL,
};

#[derive(Debug, Parser)]
#[command(name = "pfp-forge", version, about = "Forge AI profile pictures with collectible metadata")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session: type a concept to forge, /help for commands.
    Chat(ChatArgs),
    /// Forge a single avatar and exit.
    Run(RunArgs),
    /// List the available styles.
    Styles,
}

#[derive(Debug, Args)]
struct ForgeArgs {
    #[arg(long)]
    style: Option<StyleOption>,
    #[arg(long, default_value = "forge-out")]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    image_model: Option<String>,
    #[arg(long)]
    text_model: Option<String>,
    #[arg(long)]
    mint_delay_ms: Option<u64>,
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    forge: ForgeArgs,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    mint: bool,
    #[command(flatten)]
    forge: ForgeArgs,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("pfp-forge error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            init_tracing(&args.forge.log_level);
            run_chat_native(args)?;
            Ok(0)
        }
        Command::Run(args) => {
            init_tracing(&args.forge.log_level);
            run_run_native(args)
        }
        Command::Styles => {
            print!("{}", style_selector(StyleOption::default()));
            Ok(0)
        }
    }
}

fn init_tracing(log_level: &str) {
    let fallback_level = match log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "error" => "error",
        "off" => "off",
        _ => "warn",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(args: &ForgeArgs) -> Result<ForgeConfig> {
    let mut config = ForgeConfig::from_env()?;
    if let Some(model) = non_empty(args.image_model.as_deref()) {
        config.image_model = model;
    }
    if let Some(model) = non_empty(args.text_model.as_deref()) {
        config.text_model = model;
    }
    if let Some(millis) = args.mint_delay_ms {
        config.mint_delay = Duration::from_millis(millis);
    }
    Ok(config)
}

fn build_controller(args: &ForgeArgs) -> Result<ForgeController> {
    let config = resolve_config(args)?;
    info!(?config, "forge configuration resolved");
    let mut controller = ForgeController::from_config(&config)?;
    if let Some(style) = args.style {
        controller = controller.with_style(style);
    }
    if let Some(path) = args.events.as_ref() {
        let session_id = format!("forge-{}", compact_timestamp());
        controller = controller.with_events(SessionLog::new(path, session_id));
    }
    Ok(controller)
}

fn run_chat_native(args: ChatArgs) -> Result<()> {
    let out_dir = args.forge.out.clone();
    let mut controller = build_controller(&args.forge)?;

    let stdin = io::stdin();
    let mut line = String::new();

    println!("PFP Forge started. Type /help for commands.");
    print!("{}", view_panel(controller.view_state(), controller.selected_style()));
    print!("{}", style_selector(controller.selected_style()));

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        if intent.action == "noop" {
            continue;
        }

        match intent.action.as_str() {
            "help" => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
                println!("Anything else is forged as a character concept.");
            }
            "quit" => break,
            "list_styles" => {
                print!("{}", style_selector(controller.selected_style()));
            }
            "select_style" => {
                let Some(raw) = value_as_non_empty_string(intent.command_args.get("style")) else {
                    println!("/style requires a name or number");
                    print!("{}", style_selector(controller.selected_style()));
                    continue;
                };
                match raw.parse::<StyleOption>() {
                    Ok(style) => {
                        controller.select_style(style);
                        println!("Style set to {style}");
                    }
                    Err(message) => println!("{message}"),
                }
            }
            "status" => {
                println!(
                    "State: {} | Style: {} | History: {} | Service: {}{}",
                    controller.view_state().name(),
                    controller.selected_style(),
                    controller.history().len(),
                    controller.service_name(),
                    if controller.is_minting() { " | minting" } else { "" },
                );
            }
            "history" => {
                let active_id = controller.active_artifact().map(|artifact| artifact.id.clone());
                print!("{}", history_list(controller.history(), active_id.as_deref()));
            }
            "download" => {
                let Some(artifact) = controller.active_artifact().cloned() else {
                    println!("Nothing to download yet.");
                    continue;
                };
                let dest = value_as_non_empty_string(intent.command_args.get("path"))
                    .map(PathBuf::from)
                    .unwrap_or_else(|| out_dir.clone());
                match save_image(&artifact, &dest) {
                    Ok(saved) => println!("Saved {}", describe_saved(&saved)),
                    Err(err) => println!("Download failed: {err:#}"),
                }
            }
            "mint" => {
                let Some(artifact_id) = controller.active_artifact().map(|row| row.id.clone())
                else {
                    println!("Nothing to mint yet. Forge an avatar first.");
                    continue;
                };
                mint_active(&mut controller, &artifact_id);
            }
            "unknown" => {
                let command = value_as_non_empty_string(intent.command_args.get("command"))
                    .unwrap_or_else(|| "unknown".to_string());
                println!("Unknown command: {command}");
            }
            "generate" => {
                let prompt = intent.prompt.clone().unwrap_or_default();
                print!("{}", forge_and_render(&mut controller, &prompt, None));
            }
            other => {
                println!("Unknown command: {other}");
            }
        }
    }

    Ok(())
}

fn run_run_native(args: RunArgs) -> Result<i32> {
    if args.prompt.trim().is_empty() {
        bail!("--prompt must not be empty");
    }
    let mut controller = build_controller(&args.forge)?;
    print!(
        "{}",
        forge_and_render(&mut controller, &args.prompt, Some(&args.forge.out))
    );

    let artifact_id = match controller.view_state() {
        ViewState::Result(artifact) => artifact.id.clone(),
        _ => return Ok(1),
    };
    if args.mint {
        mint_active(&mut controller, &artifact_id);
    }
    Ok(0)
}

/// Runs one generation and renders the resulting panel. The image is written
/// to disk only when `save_to` is given; chat mode leaves that to `/download`.
fn forge_and_render(
    controller: &mut ForgeController,
    prompt: &str,
    save_to: Option<&Path>,
) -> String {
    let Some(ticket) = controller.begin_generation(prompt) else {
        return String::new();
    };
    print!("{}", generating_panel(ticket.prompt(), ticket.style()));
    let _ = io::stdout().flush();
    controller.run_generation(ticket);

    match controller.view_state() {
        ViewState::Result(artifact) => {
            let mut out = String::new();
            let saved = match save_to.map(|dest| save_image(artifact, dest)) {
                Some(Ok(saved)) => Some(saved),
                Some(Err(err)) => {
                    out.push_str(&format!("Image not saved: {err:#}\n"));
                    None
                }
                None => None,
            };
            out.push_str(&result_card(artifact, saved.as_ref()));
            out
        }
        state => view_panel(state, controller.selected_style()),
    }
}

fn mint_active(controller: &mut ForgeController, artifact_id: &str) {
    println!("{MINTING_LABEL}");
    let _ = io::stdout().flush();
    match controller.mint(artifact_id) {
        Some(receipt) => println!("{}", receipt.message),
        None => println!("Mint already in progress."),
    }
}

fn compact_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn value_as_non_empty_string(value: Option<&Value>) -> Option<String> {
    non_empty(value.and_then(Value::as_str))
}
