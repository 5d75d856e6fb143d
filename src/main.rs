use anyhow::{bail, Context};
use clap::Parser;
use inquire::error::InquireResult;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod eid;
mod entries;
mod errors;
mod search_query;
mod storage;
mod store;
mod tag_tree;
#[cfg(test)]
mod tests;
mod web;

use config::Config;
use store::{Document, EntryStore};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<EntryStore> {
    let storage = config.storage()?;
    EntryStore::load(storage, &config.data_file)
        .with_context(|| format!("cannot load {}", config.data_file))
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging();

    let mut config = Config::load()?;

    match args.command {
        cli::Command::Serve { addr } => {
            if let Some(addr) = addr {
                config.listen_addr = addr;
            }
            let store = open_store(&config)?;
            web::start_daemon(config, store)
        }

        cli::Command::Search { query, path, count } => {
            let store = open_store(&config)?;
            let path = path.unwrap_or_else(|| config.default_path.clone());
            let mut results = store.search(&query.join(" "), &path);

            if count {
                println!("{} entries found", results.count);
                return Ok(());
            }

            results.entries.sort_by(|a, b| a.title.cmp(&b.title));
            println!("{}", serde_json::to_string_pretty(&results.entries)?);
            Ok(())
        }

        cli::Command::Tree { json } => {
            let store = open_store(&config)?;
            let tree = store.tag_tree();
            if json {
                println!("{}", serde_json::to_string_pretty(&tree.view())?);
            } else {
                print!("{}", cli::render_tree(&tree));
            }
            Ok(())
        }

        cli::Command::Import { file, yes } => {
            let raw = std::fs::read(&file).with_context(|| format!("cannot read {file}"))?;
            let items = match serde_json::from_slice::<serde_json::Value>(&raw)? {
                serde_json::Value::Array(items) => items,
                serde_json::Value::Object(mut obj) => match obj.remove("entries") {
                    Some(serde_json::Value::Array(items)) => items,
                    _ => bail!("{file}: entries must be a list"),
                },
                _ => bail!("{file}: expected an export document or an array of entries"),
            };

            let store = open_store(&config)?;
            if !yes {
                match inquire::prompt_confirmation(format!(
                    "Replace {} existing entries with {} from {file}?",
                    store.total(),
                    items.len()
                )) {
                    InquireResult::Ok(true) => {}
                    InquireResult::Ok(false) => return Ok(()),
                    InquireResult::Err(err) => bail!("An error occurred: {}", err),
                }
            }

            let imported = store.import(items)?;
            println!("{imported} entries imported");
            Ok(())
        }

        cli::Command::Export { output } => {
            let store = open_store(&config)?;
            let doc: Document = store.export();
            let data = serde_json::to_string_pretty(&doc)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, data).with_context(|| format!("cannot write {path}"))?;
                    log::info!("exported {} entries to {path}", doc.entries.len());
                }
                None => println!("{data}"),
            }
            Ok(())
        }
    }
}
