#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::DocumentStore;
use crate::domain::models::PendingQuery;
use crate::domain::services::DocumentRegistry;
use crate::domain::services::Microphone;
use crate::domain::services::RecordingController;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::audio::FileAudioInput;
use crate::infrastructure::credentials::FileCredentials;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn api_client() -> Result<Arc<ApiClient>> {
    let client = ApiClient::from_config(Arc::new(FileCredentials::default()))?;
    return Ok(Arc::new(client));
}

fn prompt_email(matches: &ArgMatches) -> Result<String> {
    if let Some(email) = matches.get_one::<String>("email") {
        return Ok(email.to_string());
    }

    let email = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Email")
        .interact_text()?;

    return Ok(email);
}

fn prompt_password(matches: &ArgMatches, confirm: bool) -> Result<String> {
    if let Some(password) = matches.get_one::<String>("password") {
        return Ok(password.to_string());
    }

    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }

    return Ok(prompt.interact()?);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn print_documents_list() -> Result<()> {
    let mut registry = DocumentRegistry::new(
        api_client()?,
        Config::get_duration(ConfigKey::RefreshDelay)?,
    );
    let documents = registry.refresh().await?;

    if documents.is_empty() {
        println!("There are no documents yet. Upload your first one with `guardrail documents upload <file>`.");
    } else {
        let lines = documents
            .iter()
            .map(ui::format_document)
            .collect::<Vec<String>>();
        println!("{}", lines.join("\n"));
    }

    return Ok(());
}

async fn upload_document(file: &str) -> Result<()> {
    let mut registry = DocumentRegistry::new(
        api_client()?,
        Config::get_duration(ConfigKey::RefreshDelay)?,
    );
    let receipt = registry.upload(path::Path::new(file)).await?;
    println!(
        "Uploaded {file} (ID: {}), status: {}",
        receipt.document_id, receipt.status
    );

    if let Some(document) = registry
        .documents()
        .iter()
        .find(|document| return document.id == receipt.document_id)
    {
        println!("{}", ui::format_document(document));
    }

    return Ok(());
}

async fn transcribe_file(file: &str) -> Result<()> {
    let input = FileAudioInput::new(path::PathBuf::from(file));
    let mut recorder = RecordingController::new(Microphone::new(Arc::new(input)), api_client()?);
    let mut pending = PendingQuery::default();

    recorder.start().await?;
    recorder.stop(&mut pending).await?;
    println!("{}", pending.text());

    return Ok(());
}

fn arg_email() -> Arg {
    return Arg::new("email")
        .short('e')
        .long("email")
        .env("GUARDRAIL_EMAIL")
        .num_args(1)
        .help("Account email. Prompted for when omitted.");
}

fn arg_password() -> Arg {
    return Arg::new("password")
        .short('p')
        .long("password")
        .env("GUARDRAIL_PASSWORD")
        .hide_env_values(true)
        .num_args(1)
        .help("Account password. Prompted for when omitted.");
}

fn arg_document_id() -> Arg {
    return Arg::new("id")
        .help("Document ID, as shown by `documents list`.")
        .required(true);
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_documents() -> Command {
    return Command::new("documents")
        .about("Manage the documents in your knowledge base.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all documents with their status and risk level."))
        .subcommand(
            Command::new("show")
                .about("Show a single document.")
                .arg(arg_document_id()),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a file for redaction and indexing.")
                .arg(Arg::new("file").help("Path to the file to upload.").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a document.")
                .arg(arg_document_id()),
        );
}

pub fn build() -> Command {
    let commands_text = ui::help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("guardrail")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a chat session with your documents. This is the default command."))
        .subcommand(
            Command::new("login")
                .about("Log in with email and password. The token is saved to the token file.")
                .arg(arg_email())
                .arg(arg_password()),
        )
        .subcommand(
            Command::new("google-login")
                .about("Log in with a Google identity credential.")
                .arg(
                    Arg::new("credential")
                        .long("credential")
                        .env("GUARDRAIL_GOOGLE_CREDENTIAL")
                        .hide_env_values(true)
                        .num_args(1)
                        .help("ID token issued by Google Sign-In.")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("register")
                .about("Create a new account.")
                .arg(arg_email())
                .arg(arg_password()),
        )
        .subcommand(Command::new("logout").about("Remove the saved token."))
        .subcommand(subcommand_documents())
        .subcommand(
            Command::new("transcribe")
                .about("Transcribe a recorded audio file and print the text.")
                .arg(Arg::new("file").help("Path to the audio file.").required(true)),
        )
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .short('u')
                .long(ConfigKey::ApiURL.to_string())
                .env("GUARDRAIL_API_URL")
                .num_args(1)
                .help(format!("GuardRail server URL. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("GUARDRAIL_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::RefreshDelay.to_string())
                .long(ConfigKey::RefreshDelay.to_string())
                .env("GUARDRAIL_REFRESH_DELAY")
                .num_args(1)
                .help(format!("Time to wait in milliseconds after an upload before reloading the document list. [default: {}]", Config::default(ConfigKey::RefreshDelay)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("GUARDRAIL_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for a server response. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::TokenFile.to_string())
                .long(ConfigKey::TokenFile.to_string())
                .env("GUARDRAIL_TOKEN_FILE")
                .num_args(1)
                .help(format!("Where the access token is saved between runs. [default: {}]", Config::default(ConfigKey::TokenFile)))
                .global(true),
        );
}

/// Loads configuration from every level of `matches`, so flags given before
/// or after the subcommand both apply.
pub async fn load_config(matches: &ArgMatches) -> Result<()> {
    let mut levels = vec![matches];
    let mut current = matches;
    while let Some((_, sub_matches)) = current.subcommand() {
        levels.push(sub_matches);
        current = sub_matches;
    }

    return Config::load(levels).await;
}

/// Runs one-shot subcommands. Returns true when the chat console should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("login", subcmd_matches)) => {
            load_config(&matches).await?;
            let email = prompt_email(subcmd_matches)?;
            let password = prompt_password(subcmd_matches, false)?;

            api_client()?.login(&email, &password).await?;
            println!("Logged in as {email}");
            return Ok(false);
        }
        Some(("google-login", subcmd_matches)) => {
            load_config(&matches).await?;
            let credential = subcmd_matches
                .get_one::<String>("credential")
                .context("A Google credential is required")?;

            api_client()?.google_login(credential).await?;
            println!("Logged in with Google");
            return Ok(false);
        }
        Some(("register", subcmd_matches)) => {
            load_config(&matches).await?;
            let email = prompt_email(subcmd_matches)?;
            let password = prompt_password(subcmd_matches, true)?;

            api_client()?.register(&email, &password).await?;
            println!("Registered {email}. Log in with `guardrail login`.");
            return Ok(false);
        }
        Some(("logout", _)) => {
            load_config(&matches).await?;
            api_client()?.logout()?;
            println!("Logged out");
            return Ok(false);
        }
        Some(("documents", subcmd_matches)) => {
            load_config(&matches).await?;
            match subcmd_matches.subcommand() {
                Some(("list", _)) => {
                    print_documents_list().await?;
                }
                Some(("show", show_matches)) => {
                    let id = show_matches
                        .get_one::<String>("id")
                        .context("A document ID is required")?;
                    let document = api_client()?.get_document(id).await?;
                    println!("{}", ui::format_document(&document));
                }
                Some(("upload", upload_matches)) => {
                    let file = upload_matches
                        .get_one::<String>("file")
                        .context("A file to upload is required")?;
                    upload_document(file).await?;
                }
                Some(("delete", delete_matches)) => {
                    let id = delete_matches
                        .get_one::<String>("id")
                        .context("A document ID is required")?;
                    api_client()?.delete_document(id).await?;
                    println!("Deleted document {id}");
                }
                _ => {
                    subcommand_documents().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("transcribe", subcmd_matches)) => {
            load_config(&matches).await?;
            let file = subcmd_matches
                .get_one::<String>("file")
                .context("An audio file is required")?;
            transcribe_file(file).await?;
            return Ok(false);
        }
        _ => {
            load_config(&matches).await?;
        }
    }

    return Ok(true);
}
