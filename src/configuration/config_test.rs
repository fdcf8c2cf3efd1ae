use std::time::Duration;

use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    assert!(res.contains("api-url = \"http://localhost:8000\""));
    assert!(res.contains("refresh-delay = 1000"));
    assert!(!res.contains("config-file"));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "guardrail",
        "chat",
        "-c",
        "./config.example.toml",
    ])?;
    cli::load_config(&matches).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "guardrail",
        "chat",
        "-c",
        "./test/bad-config.toml",
    ])?;
    let res = cli::load_config(&matches).await;
    assert!(res.is_err());
    return Ok(());
}

#[test]
fn it_parses_default_durations() -> Result<()> {
    assert_eq!(
        Config::get_duration(ConfigKey::RequestTimeout)?,
        Duration::from_secs(120)
    );
    return Ok(());
}
