#![cfg(test)]
#![allow(
    clippy::tests_outside_test_module,
    reason = "Integration tests live at the crate root"
)]
#![allow(
    clippy::assertions_on_result_states,
    reason = "Only the failure matters, not its message"
)]

use anyhow::Error;
use patch::PatchStorage as _;
use restyle::cli::{Command, run, site_host};
use restyle::{JsonFileStorage, RestyleConfig};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::fs::write as tokio_fs_write;
use tokio::runtime::Handle;

fn config(dir: &TempDir) -> RestyleConfig {
    RestyleConfig::new("restyle".to_owned(), 200, dir.path().join("store.json"))
}

async fn exec(config: &RestyleConfig, args: &[&str]) -> Result<String, Error> {
    let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
    let mut out = Vec::new();
    run(&Handle::current(), config, Command::parse(&args)?, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn parses_commands() -> Result<(), Error> {
    let args = ["unset", "https://a.test/", "#x", "color"].map(str::to_owned);
    assert_eq!(
        Command::parse(&args)?,
        Command::Unset {
            url: "https://a.test/".to_owned(),
            selector: "#x".to_owned(),
            property: "color".to_owned(),
        }
    );
    let pick = ["pick", "page.html", "p"].map(str::to_owned);
    assert_eq!(
        Command::parse(&pick)?,
        Command::Pick {
            file: PathBuf::from("page.html"),
            query: "p".to_owned(),
        }
    );
    assert!(Command::parse(&[]).is_err());
    assert!(Command::parse(&["export".to_owned()]).is_err());
    assert!(Command::parse(&["frobnicate".to_owned(), "x".to_owned()]).is_err());
    Ok(())
}

#[test]
fn host_keeps_explicit_ports() -> Result<(), Error> {
    assert_eq!(site_host("https://example.com/a/b?q=1")?, "example.com");
    assert_eq!(site_host("http://localhost:8080/")?, "localhost:8080");
    assert_eq!(site_host("https://example.com:443/")?, "example.com");
    assert!(site_host("not a url").is_err());
    assert!(site_host("data:text/plain,hi").is_err());
    Ok(())
}

#[tokio::test]
async fn set_then_export_per_host() -> Result<(), Error> {
    let dir = TempDir::new()?;
    let config = config(&dir);
    exec(&config, &["set", "https://a.test/x", "#title", "color", " red "]).await?;
    exec(&config, &["set", "https://a.test/y", "#title", "margin", "0"]).await?;
    exec(&config, &["set", "https://b.test/", ".nav", "display", "none"]).await?;

    assert_eq!(
        exec(&config, &["export", "https://a.test/"]).await?,
        "#title {\n  color: red !important;\n  margin: 0 !important;\n}\n"
    );
    assert_eq!(
        exec(&config, &["export", "https://b.test/"]).await?,
        ".nav {\n  display: none !important;\n}\n"
    );
    assert_eq!(exec(&config, &["export", "https://c.test/"]).await?, "");
    Ok(())
}

#[tokio::test]
async fn set_rejects_empty_inputs() -> Result<(), Error> {
    let dir = TempDir::new()?;
    let config = config(&dir);
    assert!(
        exec(&config, &["set", "https://a.test/", "#x", " ", "red"])
            .await
            .is_err()
    );
    assert!(!config.store_path.exists());
    Ok(())
}

#[tokio::test]
async fn unset_and_clear() -> Result<(), Error> {
    let dir = TempDir::new()?;
    let config = config(&dir);
    exec(&config, &["set", "https://a.test/", "#x", "color", "red"]).await?;
    exec(&config, &["set", "https://a.test/", "#x", "width", "1px"]).await?;
    exec(&config, &["set", "https://b.test/", "#y", "color", "blue"]).await?;

    exec(&config, &["unset", "https://a.test/", "#x", "color"]).await?;
    assert_eq!(
        exec(&config, &["export", "https://a.test/"]).await?,
        "#x {\n  width: 1px !important;\n}\n"
    );

    exec(&config, &["clear", "https://a.test/"]).await?;
    let storage = JsonFileStorage::new(config.store_path.clone());
    assert!(storage.get("restyle:a.test").await?.is_none());
    assert!(storage.get("restyle:b.test").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn pick_and_edit_from_an_html_file() -> Result<(), Error> {
    let dir = TempDir::new()?;
    let config = config(&dir);
    let page = dir.path().join("page.html");
    tokio_fs_write(
        &page,
        r#"<html><body><ul><li>a</li><li data-testid="second">b</li></ul></body></html>"#,
    )
    .await?;
    let page = page.to_string_lossy().into_owned();

    assert_eq!(
        exec(&config, &["pick", &page, "li:last-child"]).await?,
        "li[data-testid=\"second\"]\n"
    );
    assert!(exec(&config, &["pick", &page, "table"]).await.is_err());

    assert_eq!(
        exec(
            &config,
            &["edit", &page, "http://localhost:3000/", "li", "color", "red"]
        )
        .await?,
        "li:nth-of-type(1)\n"
    );
    assert_eq!(
        exec(&config, &["export", "http://localhost:3000/"]).await?,
        "li:nth-of-type(1) {\n  color: red !important;\n}\n"
    );
    Ok(())
}

#[tokio::test]
async fn corrupt_store_file_is_reported() -> Result<(), Error> {
    let dir = TempDir::new()?;
    let config = config(&dir);
    tokio_fs_write(&config.store_path, "{ not json").await?;
    assert!(exec(&config, &["export", "https://a.test/"]).await.is_err());
    Ok(())
}
