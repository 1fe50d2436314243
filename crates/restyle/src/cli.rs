//! Command-line front end.

use crate::config::RestyleConfig;
use crate::session::InspectorSession;
use crate::storage::JsonFileStorage;
use anyhow::{Error, anyhow};
use html::{Document, NodeId};
use log::{info, warn};
use patch::{OverridePatchStore, StoreEvent};
use picker::{element_path, synthesize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs::read_to_string as tokio_fs_read_to_string;
use tokio::runtime::Handle;
use url::Url;

pub const USAGE: &str = "\
usage:
  restyle pick <file.html> <query>
  restyle edit <file.html> <url> <query> <property> <value>
  restyle set <url> <selector> <property> <value>
  restyle unset <url> <selector> <property>
  restyle export <url>
  restyle clear <url>";

/// Depth of the breadcrumb logged by `pick`.
const PATH_DEPTH: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the synthesized selector of the first element matching `query`.
    Pick { file: PathBuf, query: String },
    /// Pick like `pick`, then override `property` on it for the site of `url`.
    Edit {
        file: PathBuf,
        url: String,
        query: String,
        property: String,
        value: String,
    },
    Set {
        url: String,
        selector: String,
        property: String,
        value: String,
    },
    Unset {
        url: String,
        selector: String,
        property: String,
    },
    /// Print the site's override CSS.
    Export { url: String },
    /// Delete everything stored for the site.
    Clear { url: String },
}

impl Command {
    /// Parse the arguments that follow the program name.
    ///
    /// # Errors
    /// Returns the usage text if the arguments do not form a command.
    pub fn parse(args: &[String]) -> Result<Self, Error> {
        let Some((name, rest)) = args.split_first() else {
            return Err(anyhow!("missing command\n{USAGE}"));
        };
        Ok(match (name.as_str(), rest) {
            ("pick", [file, query]) => Self::Pick {
                file: PathBuf::from(file),
                query: query.clone(),
            },
            ("edit", [file, url, query, property, value]) => Self::Edit {
                file: PathBuf::from(file),
                url: url.clone(),
                query: query.clone(),
                property: property.clone(),
                value: value.clone(),
            },
            ("set", [url, selector, property, value]) => Self::Set {
                url: url.clone(),
                selector: selector.clone(),
                property: property.clone(),
                value: value.clone(),
            },
            ("unset", [url, selector, property]) => Self::Unset {
                url: url.clone(),
                selector: selector.clone(),
                property: property.clone(),
            },
            ("export", [url]) => Self::Export { url: url.clone() },
            ("clear", [url]) => Self::Clear { url: url.clone() },
            _ => return Err(anyhow!("unrecognized command `{name}`\n{USAGE}")),
        })
    }
}

/// The host (with port, if any) that keys a page's overrides.
///
/// # Errors
/// Returns an error if `url` does not parse or has no host.
pub fn site_host(url: &str) -> Result<String, Error> {
    let parsed = Url::parse(url).map_err(|err| anyhow!("Invalid url {url}: {err}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Url {url} has no host"))?;
    Ok(parsed
        .port()
        .map_or_else(|| host.to_owned(), |port| format!("{host}:{port}")))
}

/// Run one command, writing its output to `out`.
///
/// # Errors
/// Returns an error if an input cannot be read or parsed, nothing matches the query, or the
/// overrides cannot be loaded or saved.
pub async fn run<W: Write>(
    handle: &Handle,
    config: &RestyleConfig,
    command: Command,
    out: &mut W,
) -> Result<(), Error> {
    match command {
        Command::Pick { file, query } => {
            let doc = load_document(&file).await?;
            let element = first_match(&doc, &query)?;
            info!("picked {}", element_path(&doc, element, PATH_DEPTH).join(" > "));
            writeln!(out, "{}", synthesize(&doc, element))?;
        }
        Command::Edit {
            file,
            url,
            query,
            property,
            value,
        } => {
            let doc = load_document(&file).await?;
            let element = first_match(&doc, &query)?;
            let mut session = InspectorSession::new(open_store(handle, config, &url).await?);
            let selection = session
                .select(&doc, element)
                .ok_or_else(|| anyhow!("`{query}` matches the tool's own UI"))?;
            if !session.apply(&property, &value) {
                return Err(anyhow!("property and value must not be empty"));
            }
            writeln!(out, "{}", selection.selector)?;
            close_store(session.into_store()).await?;
        }
        Command::Set {
            url,
            selector,
            property,
            value,
        } => {
            let (selector, property, value) = (selector.trim(), property.trim(), value.trim());
            if selector.is_empty() || property.is_empty() || value.is_empty() {
                return Err(anyhow!("selector, property and value must not be empty"));
            }
            let mut store = open_store(handle, config, &url).await?;
            store.set_property(selector, property, value);
            close_store(store).await?;
        }
        Command::Unset {
            url,
            selector,
            property,
        } => {
            let mut store = open_store(handle, config, &url).await?;
            if !store.has_property(selector.trim(), property.trim()) {
                warn!("`{selector}` has no override for `{property}`");
            }
            store.remove_property(selector.trim(), property.trim());
            close_store(store).await?;
        }
        Command::Export { url } => {
            let store = open_store(handle, config, &url).await?;
            let css = store.export_text();
            if css.is_empty() {
                info!("no overrides stored under {}", store.storage_key());
            } else {
                writeln!(out, "{css}")?;
            }
        }
        Command::Clear { url } => {
            let mut store = open_store(handle, config, &url).await?;
            store.forget_site().await?;
            close_store(store).await?;
        }
    }
    Ok(())
}

async fn load_document(file: &Path) -> Result<Document, Error> {
    let markup = tokio_fs_read_to_string(file)
        .await
        .map_err(|err| anyhow!("Failed to read {}: {err}", file.display()))?;
    Document::parse(&markup)
}

fn first_match(doc: &Document, query: &str) -> Result<NodeId, Error> {
    doc.query_selector(query)?
        .ok_or_else(|| anyhow!("no element matches `{query}`"))
}

async fn open_store(
    handle: &Handle,
    config: &RestyleConfig,
    url: &str,
) -> Result<OverridePatchStore<JsonFileStorage>, Error> {
    let host = site_host(url)?;
    let mut store = OverridePatchStore::new(
        handle.clone(),
        JsonFileStorage::new(config.store_path.clone()),
        config.storage_key(&host),
        config.save_delay(),
    );
    store.hydrate().await?;
    Ok(store)
}

/// Flush any pending save and report whether it made it to disk.
async fn close_store(store: OverridePatchStore<JsonFileStorage>) -> Result<(), Error> {
    let mut events = store.subscribe();
    store.dispose().await;
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::PersistFailed(reason) = event {
            return Err(anyhow!("Failed to save overrides: {reason}"));
        }
    }
    Ok(())
}
