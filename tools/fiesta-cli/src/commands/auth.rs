//! Sign-in commands.

use anyhow::{bail, Result};
use fiesta_auth::{AuthSession, Role, User};

use super::{AuthArgs, AuthCommand};
use crate::config::BackendMode;
use crate::context::{Context, Storefront};

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;

    match args.command {
        AuthCommand::Register { email, name, admin } => {
            if store.mode != BackendMode::Local {
                bail!("Users are registered with the hosted identity service in remote mode");
            }
            let mut user = User::new(&email)?;
            if let Some(name) = name {
                user = user.with_name(name);
            }
            if admin {
                user = user.with_role(Role::Admin);
            }
            let user = store.sessions.register(user)?;
            ctx.output
                .success(&format!("Registered {} as {}", user.email, user.role));
        }
        AuthCommand::SignIn { email } => {
            let session = sign_in(&store, &email, ctx).await?;
            if ctx.output.is_json() {
                ctx.output.json(&session.user);
            }
            ctx.output
                .success(&format!("Signed in as {}", session.user.display_name()));
        }
        AuthCommand::SignOut => {
            store.identity.sign_out().await?;
            store.sessions.end_session()?;
            ctx.output.success("Signed out");
        }
        AuthCommand::Whoami => whoami(&store, ctx).await?,
    }
    Ok(())
}

async fn sign_in(store: &Storefront, email: &str, ctx: &Context) -> Result<AuthSession> {
    match store.mode {
        BackendMode::Local => Ok(store.sessions.sign_in(email)?),
        BackendMode::Remote => remote_sign_in(store, email, ctx).await,
    }
}

#[cfg(feature = "remote")]
async fn remote_sign_in(store: &Storefront, email: &str, ctx: &Context) -> Result<AuthSession> {
    use dialoguer::Password;
    use fiesta_auth::RemoteIdentity;

    let (base_url, api_key) = ctx.remote_credentials()?;
    let password = Password::new().with_prompt("Password").interact()?;

    let spinner = ctx.output.spinner("Signing in...");
    let session = RemoteIdentity::new(base_url, api_key)
        .sign_in_with_password(email, &password)
        .await;
    spinner.finish_and_clear();

    let session = session?;
    store.sessions.save_session(&session)?;
    Ok(session)
}

#[cfg(not(feature = "remote"))]
async fn remote_sign_in(_store: &Storefront, _email: &str, _ctx: &Context) -> Result<AuthSession> {
    bail!("Signing in to the hosted service needs a build with the `remote` feature")
}

async fn whoami(store: &Storefront, ctx: &Context) -> Result<()> {
    let Some(user) = store.identity.current_user().await? else {
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::Value::Null);
        }
        ctx.output.info("Not signed in");
        return Ok(());
    };
    let admin = store.identity.is_privileged(&user).await?;
    let session = store.sessions.current_session()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "id": user,
            "email": session.as_ref().map(|s| s.user.email.clone()),
            "admin": admin,
            "expires_at": session.as_ref().map(|s| s.expires_at),
        }));
        return Ok(());
    }

    ctx.output.header("Signed in");
    ctx.output.kv("id", user.as_str());
    if let Some(session) = &session {
        ctx.output.kv("email", &session.user.email);
        ctx.output.kv("expires", &session.expires_at.format("%Y-%m-%d %H:%M").to_string());
    }
    ctx.output.kv("role", if admin { "admin" } else { "customer" });
    Ok(())
}
