use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use colored::Colorize;
use gamedata_store::{
    DateTime, GameData, SaveLocation, StoreConfig, StoreValue, TimeDelta, Utc,
};
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Init(_) => cmd_init(config, json),
        Command::Save(_) => cmd_save(config, json),
        Command::Clear(_) => cmd_clear(config, json),
        Command::Locate(_) => cmd_locate(config, json),
        Command::Show(_) => cmd_show(config, json),
        Command::Get(args) => cmd_get(config, args, json),
        Command::Set(args) => cmd_set(config, args, json),
    }
}

/// Store settings from `--config`, overridden by individual flags.
pub fn build_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config_file(path)?,
        None => StoreConfig::default(),
    };

    if let Some(name) = &cli.name {
        config.file_name = name.clone();
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = encoding.into();
    }
    if cli.release {
        config.obscure = true;
    }
    if let Some(dir) = &cli.dir {
        config.location = SaveLocation::explicit(dir);
    }
    Ok(config)
}

fn read_config_file(path: &Path) -> anyhow::Result<StoreConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn open(config: StoreConfig) -> anyhow::Result<GameData> {
    let path = config.backing_path().ok();
    GameData::init(config).with_context(|| match path {
        Some(path) => format!("opening game data at {}", path.display()),
        None => "opening game data".to_string(),
    })
}

fn metadata_json(store: &GameData) -> serde_json::Value {
    json!({
        "path": store.path().display().to_string(),
        "encoding": store.encoding().as_str(),
        "obscure": store.config().obscure,
        "created_at": store.created_at().to_stored(),
        "updated_at": store.updated_at().to_stored(),
        "total_play_time": store.total_play_time().to_stored(),
    })
}

fn print_metadata(store: &GameData) {
    println!("  Path: {}", store.path().display().to_string().bold());
    println!("  Encoding: {}{}", store.encoding().as_str().cyan(), if store.config().obscure { " (obscured)" } else { "" });
    println!("  Created: {}", store.created_at().to_stored());
    println!("  Updated: {}", store.updated_at().to_stored());
    println!("  Play time: {}", store.total_play_time().to_stored().yellow());
}

fn cmd_init(config: StoreConfig, json: bool) -> anyhow::Result<()> {
    let store = open(config)?;
    let exists = store.path().is_file();
    if json {
        let mut out = metadata_json(&store);
        out["exists"] = json!(exists);
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let state = if exists { "loaded".green() } else { "new, not saved yet".yellow() };
    println!("{} Game data {}", "✓".green().bold(), state);
    print_metadata(&store);
    Ok(())
}

fn cmd_save(config: StoreConfig, json: bool) -> anyhow::Result<()> {
    let mut store = open(config)?;
    store
        .save()
        .with_context(|| format!("saving {}", store.path().display()))?;

    if json {
        let mut out = metadata_json(&store);
        out["entries"] = json!(store.len());
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{} Saved {} entries", "✓".green().bold(), store.len().to_string().bold());
        print_metadata(&store);
    }
    Ok(())
}

fn cmd_clear(config: StoreConfig, json: bool) -> anyhow::Result<()> {
    let path = config.backing_path()?;
    let removed = GameData::delete_save_at(&config)
        .with_context(|| format!("deleting {}", path.display()))?;

    if json {
        println!("{}", json!({ "path": path.display().to_string(), "removed": removed }));
    } else if removed {
        println!("{} Deleted {}", "✓".green().bold(), path.display().to_string().bold());
    } else {
        println!("Nothing to delete at {}", path.display());
    }
    Ok(())
}

/// First regular file in `dir`, by name.
pub fn first_file(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files.into_iter().next())
}

fn cmd_locate(config: StoreConfig, json: bool) -> anyhow::Result<()> {
    let dir = config
        .location
        .ensure()
        .context("resolving save directory")?;
    let file = first_file(&dir)?;

    if json {
        println!(
            "{}",
            json!({
                "directory": dir.display().to_string(),
                "file": file.as_ref().map(|f| f.display().to_string()),
            })
        );
        return Ok(());
    }

    println!("Directory: {}", dir.display().to_string().bold());
    match file {
        Some(file) => println!("File: {}", file.display().to_string().cyan()),
        None => println!("File: {}", "(none)".dimmed()),
    }
    Ok(())
}

fn cmd_show(config: StoreConfig, json: bool) -> anyhow::Result<()> {
    let store = open(config)?;

    if json {
        let entries: serde_json::Map<String, serde_json::Value> = store
            .entries()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        let mut out = metadata_json(&store);
        out["entries"] = serde_json::Value::Object(entries);
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_metadata(&store);
    println!();
    if store.is_empty() {
        println!("No entries.");
    }
    for (key, value) in store.entries() {
        println!("{} = {}", key.bold(), value);
    }
    Ok(())
}

/// Typed read; returns the value in its stored text form.
pub fn typed_get(store: &GameData, key: &str, kind: ValueKind, default: Option<&str>) -> anyhow::Result<String> {
    match kind {
        ValueKind::Bool => read_as::<bool>(store, key, kind, default),
        ValueKind::Int => read_as::<i32>(store, key, kind, default),
        ValueKind::Float => read_as::<f32>(store, key, kind, default),
        ValueKind::String => read_as::<String>(store, key, kind, default),
        ValueKind::DateTime => read_as::<DateTime<Utc>>(store, key, kind, default),
        ValueKind::TimeSpan => read_as::<TimeDelta>(store, key, kind, default),
    }
}

/// Typed write; rejects text that does not parse as `kind`.
pub fn typed_set(store: &mut GameData, key: &str, value: &str, kind: ValueKind) -> anyhow::Result<()> {
    match kind {
        ValueKind::Bool => write_as::<bool>(store, key, value, kind),
        ValueKind::Int => write_as::<i32>(store, key, value, kind),
        ValueKind::Float => write_as::<f32>(store, key, value, kind),
        ValueKind::String => write_as::<String>(store, key, value, kind),
        ValueKind::DateTime => write_as::<DateTime<Utc>>(store, key, value, kind),
        ValueKind::TimeSpan => write_as::<TimeDelta>(store, key, value, kind),
    }
}

fn parse_as<T: StoreValue>(text: &str, kind: ValueKind) -> anyhow::Result<T> {
    T::from_stored(text).ok_or_else(|| anyhow!("{text:?} is not a valid {}", kind.as_str()))
}

fn read_as<T: StoreValue>(store: &GameData, key: &str, kind: ValueKind, default: Option<&str>) -> anyhow::Result<String> {
    let value: T = match default {
        Some(text) => store.get_or(key, parse_as(text, kind)?),
        None => store.get(key),
    };
    Ok(value.to_stored())
}

fn write_as<T: StoreValue>(store: &mut GameData, key: &str, value: &str, kind: ValueKind) -> anyhow::Result<()> {
    let value: T = parse_as(value, kind)?;
    store.set(key, value);
    Ok(())
}

fn cmd_get(config: StoreConfig, args: GetArgs, json: bool) -> anyhow::Result<()> {
    let store = open(config)?;
    let value = typed_get(&store, &args.key, args.kind, args.default.as_deref())?;

    if json {
        println!(
            "{}",
            json!({
                "key": args.key,
                "type": args.kind.as_str(),
                "value": value,
                "present": store.contains_key(&args.key),
            })
        );
    } else {
        println!("{value}");
    }
    Ok(())
}

fn cmd_set(config: StoreConfig, args: SetArgs, json: bool) -> anyhow::Result<()> {
    let mut store = open(config)?;
    typed_set(&mut store, &args.key, &args.value, args.kind)?;
    store
        .save()
        .with_context(|| format!("saving {}", store.path().display()))?;

    let stored = store.get_raw(&args.key).unwrap_or_default().to_string();
    if json {
        println!("{}", json!({ "key": args.key, "type": args.kind.as_str(), "value": stored }));
    } else {
        println!("{} Set {} = {}", "✓".green().bold(), args.key.bold(), stored.cyan());
    }
    Ok(())
}
