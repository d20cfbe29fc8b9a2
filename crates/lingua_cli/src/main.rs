//! Interactive glossary shell.
//!
//! # Responsibility
//! - Load `lingua.toml`, start logging, open the glossary document.
//! - Read one command per line from stdin until `quit` or end of input.

mod commands;
mod shell;

use commands::parse_line;
use lingua_core::enrich::credentials::resolve_api_key;
use lingua_core::enrich::http::HttpEnricher;
use lingua_core::enrich::{Enricher, NoopEnricher};
use lingua_core::{
    default_log_level, init_logging, AppConfig, ConceptStore, JsonDocumentRepository,
};
use log::{info, warn};
use shell::Shell;
use std::io::{BufRead, Write};
use std::path::Path;

const CONFIG_FILE: &str = "lingua.toml";

fn main() {
    let config = match AppConfig::load(CONFIG_FILE) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let cwd = std::env::current_dir().unwrap_or_default();
    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, &config.resolved_log_dir(&cwd)) {
        eprintln!("warning: logging disabled: {err}");
    }

    let store = match ConceptStore::open(JsonDocumentRepository::new(&config.data_path)) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let enricher = build_enricher(&config);
    let mut shell = Shell::new(store, enricher, config.render.clone());
    info!(
        "event=shell_start module=cli status=ok data_path={}",
        config.data_path.display()
    );

    println!("lingua {} | type `help` for commands", lingua_core::core_version());
    print_response(&shell.execute(commands::Command::List { search: None }));

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("failed to read input: {err}");
                break;
            }
        }
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("error: {message}");
                continue;
            }
        };
        let response = shell.execute(command);
        print_response(&response);
        if response.quit {
            break;
        }
    }
    info!("event=shell_stop module=cli status=ok");
}

fn build_enricher(config: &AppConfig) -> Box<dyn Enricher> {
    if !config.enrich.enabled {
        return Box::new(NoopEnricher);
    }
    let secrets = Some(Path::new(&config.secrets_path));
    let enricher = HttpEnricher::new(
        config.enrich.base_url.clone(),
        config.enrich.model.clone(),
        config.enrich.timeout(),
        resolve_api_key(secrets),
    );
    if !enricher.has_credential() {
        warn!("event=build_enricher module=cli status=degraded reason=missing_credential");
        eprintln!("warning: no OPENAI_API_KEY found; enrichment will be skipped");
    }
    Box::new(enricher)
}

fn print_response(response: &shell::ShellResponse) {
    if response.ok {
        println!("{}", response.message);
    } else {
        println!("error: {}", response.message);
    }
}
