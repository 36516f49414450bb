//! Dev console for the session core: log in, inspect the session, log out.

use anyhow::Context as _;

use classconnect_client::{ClientConfig, Session, SessionContext, SessionGateway};
use classconnect_store::CredentialStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    classconnect_observability::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "status".to_string());

    let config = ClientConfig::from_env();
    tracing::debug!(base_url = %config.base_url(), "using API");

    let store = CredentialStore::open_default()
        .await
        .context("could not open the credential store")?;
    let context = SessionContext::new(SessionGateway::new(config, store));

    match command.as_str() {
        "login" => {
            let username = args
                .next()
                .context("usage: classconnect login <username> <password>")?;
            let password = args
                .next()
                .context("usage: classconnect login <username> <password>")?;

            match context.login(&username, &password).await {
                Ok(identity) => {
                    println!("logged in as {} ({})", identity.nome, identity.role);
                }
                Err(err) => {
                    eprintln!("login failed: {err}");
                    std::process::exit(1);
                }
            }
        }
        "status" | "whoami" => match context.bootstrap().await {
            Session::Authenticated(identity) => {
                println!("logged in as {} ({})", identity.nome, identity.role);
                println!("  id:        {}", identity.id);
                println!("  username:  {}", identity.username);
                println!("  read-only: {}", identity.is_readonly);
            }
            _ => println!("not logged in"),
        },
        "logout" => {
            context.logout().await;
            println!("logged out");
        }
        "passwd" => {
            let current = args
                .next()
                .context("usage: classconnect passwd <current> <new>")?;
            let new_password = args
                .next()
                .context("usage: classconnect passwd <current> <new>")?;

            match context.gateway().change_password(&current, &new_password).await {
                Ok(()) => println!("password changed"),
                Err(err) => {
                    eprintln!("password change failed: {err}");
                    std::process::exit(1);
                }
            }
        }
        other => {
            eprintln!("unknown command: {other}");
            eprintln!("commands: login <username> <password> | status | logout | passwd <current> <new>");
            std::process::exit(2);
        }
    }

    Ok(())
}
