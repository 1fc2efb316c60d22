// src/bin/crypta.rs
//! crypta: store, fetch, delete and list objects in the local vault

use std::env;

use anyhow::{bail, Context, Result};
use crypta_vault::{key_from_hex, MasterKey32, ObjectInfo, ObjectStore};
use rpassword::prompt_password;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 64 hex characters; prompted for when unset
const KEY_ENV: &str = "CRYPTA_MASTER_KEY";

const USAGE: &str = "usage: crypta put <file> | get <name> <dest> | delete <name> | list [--json]";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let store = ObjectStore::open_default().context("Failed to load vault configuration")?;
    info!(dir = %store.dir().display(), "vault opened");

    match args.as_slice() {
        ["put", source] => {
            let key = master_key()?;
            let stored = store
                .put(source, &key)
                .with_context(|| format!("Failed to store {source}"))?;
            println!("Stored {} ({} bytes)", stored.name, stored.size_bytes);
        }
        ["get", name, dest] => {
            let key = master_key()?;
            let written = store
                .get(name, dest, &key)
                .with_context(|| format!("Failed to retrieve {name}"))?;
            println!("Decrypted {name} → {dest} ({written} bytes)");
        }
        ["delete", name] => {
            store
                .delete(name)
                .with_context(|| format!("Failed to delete {name}"))?;
            println!("Deleted {name}");
        }
        ["list"] => print_objects(&store.list().context("Failed to list vault")?),
        ["list", "--json"] => {
            let objects = store.list().context("Failed to list vault")?;
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn master_key() -> Result<MasterKey32> {
    let encoded = match env::var(KEY_ENV) {
        Ok(value) => value,
        Err(_) => prompt_password("Master key (hex): ").context("Failed to read master key")?,
    };
    key_from_hex(&encoded).context("Master key must be exactly 32 bytes, hex-encoded")
}

fn print_objects(objects: &[ObjectInfo]) {
    if objects.is_empty() {
        println!("Vault is empty.");
        return;
    }
    println!("Stored objects:");
    for obj in objects {
        println!(
            "  - {} ({} bytes, modified {})",
            obj.name,
            obj.size_bytes,
            obj.modified_at.format("%b %d %H:%M")
        );
    }
}
