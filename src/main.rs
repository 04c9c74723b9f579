mod debug_report;

use parlance::{Context, Dispatcher, FnHandler, RuleSpec};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let dispatcher = match demo_dispatcher() {
        Ok(dispatcher) => dispatcher,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    match dispatcher.dispatch(&config.context) {
        Ok(outcome) => debug_report::print_run(&dispatcher, &config.context, &outcome, config.color),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

/// A small built-in rule set exercising every filter shape. The handlers
/// pull slot values out of the context's entities before replying, since
/// upstream slot population is not this crate's job.
fn demo_dispatcher() -> Result<Dispatcher, parlance::Error> {
    let mut dispatcher = Dispatcher::new();

    dispatcher.register(
        None,
        Arc::new(FnHandler::new("greet", |_ctx, slots, responder| {
            responder.reply(slots, ["Hi there!", "Hello!", "Hey!"]);
        })),
        RuleSpec::new().domain("smalltalk").intents(["hello", "greeting"]),
    )?;

    dispatcher.register(
        None,
        Arc::new(FnHandler::new("weather", |ctx, slots, responder| {
            if let Some(city) = ctx.entities.iter().find(|e| e.entity_type == "city") {
                slots.insert("city".to_string(), city.value.clone());
                responder.reply(slots, "Looking at the sky over {city}.");
            } else {
                responder.prompt(slots, "Which city do you mean?");
            }
        })),
        RuleSpec::new().domain("weather"),
    )?;

    dispatcher.register(
        None,
        Arc::new(FnHandler::new("forecast", |_ctx, slots, responder| {
            // Shadowed by the broader `weather` rule above: the scan runs
            // least-specific-first and stops at the first match.
            responder.reply(slots, "Here is the forecast.");
        })),
        RuleSpec::new().domain("weather").intent("forecast"),
    )?;

    dispatcher.register(
        None,
        Arc::new(FnHandler::new("paris_desk", |_ctx, slots, responder| {
            responder.reply(slots, "Bonjour! You reached the Paris desk.");
        })),
        RuleSpec::new().entities([("city", "Paris")]),
    )?;

    dispatcher.set_default_handler(Arc::new(FnHandler::new("", |_ctx, slots, responder| {
        responder.reply(slots, "Sorry, I did not catch that.");
    })));

    dispatcher.seal();
    Ok(dispatcher)
}

struct CliConfig {
    context: Context,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut domain: Option<String> = None;
    let mut intent: Option<String> = None;
    let mut entities: Vec<(String, String)> = Vec::new();
    let mut json: Option<String> = None;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("parlance {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--domain" => domain = Some(expect_value(&mut args, "--domain")?),
            "--intent" => intent = Some(expect_value(&mut args, "--intent")?),
            "--entity" => {
                let value = expect_value(&mut args, "--entity")?;
                entities.push(parse_entity(&value)?);
            }
            "--json" => {
                if json.is_some() {
                    return Err("error: --json provided multiple times".to_string());
                }
                json = Some(expect_value(&mut args, "--json")?);
            }
            _ if arg.starts_with("--domain=") => {
                domain = Some(arg.trim_start_matches("--domain=").to_string());
            }
            _ if arg.starts_with("--intent=") => {
                intent = Some(arg.trim_start_matches("--intent=").to_string());
            }
            _ if arg.starts_with("--entity=") => {
                entities.push(parse_entity(arg.trim_start_matches("--entity="))?);
            }
            _ => {
                return Err(format!("error: unknown option '{arg}'"));
            }
        }
    }

    let context = match json {
        Some(raw) => {
            if domain.is_some() || intent.is_some() || !entities.is_empty() {
                return Err("error: --json cannot be combined with --domain/--intent/--entity".to_string());
            }
            let raw = if raw == "-" { read_stdin_input()? } else { raw };
            serde_json::from_str(&raw).map_err(|err| format!("error: invalid context document: {err}"))?
        }
        None => {
            let (Some(domain), Some(intent)) = (domain, intent) else {
                return Err(format!("error: --domain and --intent are required\n\n{}", help_text()));
            };
            let mut context = Context::new(domain, intent);
            for (entity_type, value) in entities {
                context = context.with_entity(entity_type, value);
            }
            context
        }
    };

    Ok(CliConfig { context, color })
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("error: {flag} expects a value"))
}

fn parse_entity(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((entity_type, entity_value)) if !entity_type.is_empty() => {
            Ok((entity_type.to_string(), entity_value.to_string()))
        }
        _ => Err(format!("error: invalid --entity '{value}' (expected type=value)")),
    }
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "parlance {version}

Rule-based dialogue state dispatcher CLI. Dispatches one context against a
built-in demo rule set and prints the selected state and client actions.

Usage:
  parlance --domain <name> --intent <name> [--entity type=value]...
  parlance --json <document | ->

Options:
  --domain <name>            Context domain, e.g. 'weather'.
  --intent <name>            Context intent, e.g. 'forecast'.
  --entity <type=value>      A recognized entity; may be repeated.
  --json <document>          Full context as JSON; '-' reads stdin.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success.
  1  Dispatch error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
