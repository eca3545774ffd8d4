use anyhow::Context as _;
use schannel_core::{ConfigStore as _, CredentialStore, FileConfigStore, Settings};
use schannel_shared::{
    uac::Username,
    user_config::{ProxyConfig, UserConfig},
};
use secrecy::SecretString;
use tracing::info;

use crate::cli::{Command, ConfigCommand};

pub async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("failed to create data directory {:?}", settings.data_dir))?;
    match command {
        Command::Users => list_users(settings).await,
        Command::Forget { username } => forget(settings, &username).await,
        Command::Remove { username } => remove(settings, &username).await,
        Command::Config(ConfigCommand::Show) => show_config(settings),
        Command::Config(cmd) => edit_config(settings, cmd),
    }
}

async fn open_credentials(settings: &Settings) -> anyhow::Result<CredentialStore> {
    CredentialStore::open(&settings.credentials_path())
        .await
        .context("failed to open credential store")
}

async fn list_users(settings: &Settings) -> anyhow::Result<()> {
    let users = open_credentials(settings).await?.known_users().await?;
    if users.is_empty() {
        println!("No users saved");
    }
    for user in users {
        let marker = if user.has_password {
            " (password saved)"
        } else {
            ""
        };
        println!("{}{marker}", user.username);
    }
    Ok(())
}

async fn forget(settings: &Settings, username: &str) -> anyhow::Result<()> {
    let username = Username::try_from(username)?;
    let store = open_credentials(settings).await?;
    if store.forget_password(&username).await? {
        println!("Forgot the password of {username}");
    } else {
        println!("No user named {username}");
    }
    Ok(())
}

async fn remove(settings: &Settings, username: &str) -> anyhow::Result<()> {
    let username = Username::try_from(username)?;
    let store = open_credentials(settings).await?;
    if store.remove_user(&username).await? {
        println!("Removed {username}");
    } else {
        println!("No user named {username}");
    }
    Ok(())
}

fn show_config(settings: &Settings) -> anyhow::Result<()> {
    let store = FileConfigStore::new(settings.user_config_path());
    let config = store.load_or_default()?;
    println!("Config file: {:?}", store.path());
    match &config.selected_node {
        Some(node) => println!("Selected node: {node}"),
        None => println!("Selected node: <none>"),
    }
    match &config.proxy {
        Some(proxy) => println!("Proxy: {proxy}"),
        None => println!("Proxy: <none>"),
    }
    Ok(())
}

fn edit_config(settings: &Settings, cmd: ConfigCommand) -> anyhow::Result<()> {
    let store = FileConfigStore::new(settings.user_config_path());
    let config = apply_config_command(store.load_or_default()?, cmd);
    store.save(&config)?;
    info!(path = ?store.path(), "config updated");
    println!("Saved {:?}", store.path());
    Ok(())
}

fn apply_config_command(config: UserConfig, cmd: ConfigCommand) -> UserConfig {
    match cmd {
        ConfigCommand::Show => config,
        ConfigCommand::SetProxy {
            scheme,
            host,
            port,
            username,
            password,
        } => {
            let mut proxy = ProxyConfig::new(scheme, host, port);
            if let (Some(username), Some(password)) = (username, password) {
                proxy = proxy.with_auth(username, SecretString::from(password));
            }
            config.with_proxy(Some(proxy))
        }
        ConfigCommand::ClearProxy => config.with_proxy(None),
        ConfigCommand::ClearNode => config.with_selected_node(None),
    }
}
