//! Sign-in and session command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;
use vreeda_core::{
    AuthSessionManager, CoreError, MemoryUserContextStore, RedbUserContextStore, Session,
    UserContext, UserContextRepository,
};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

/// What `whoami` and `sign-in` report. Never carries tokens.
#[derive(Serialize)]
struct SessionView {
    user_id: String,
    name: Option<String>,
    email: Option<String>,
    expires: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(s: &Session) -> Self {
        Self {
            user_id: s.user.id.clone(),
            name: s.user.name.clone(),
            email: s.user.email.clone(),
            expires: s.expires,
        }
    }
}

fn session_detail(s: &SessionView) -> String {
    [
        format!("User:    {}", s.user_id),
        format!("Name:    {}", s.name.as_deref().unwrap_or("-")),
        format!("Email:   {}", s.email.as_deref().unwrap_or("-")),
        format!("Expires: {}", s.expires.to_rfc3339()),
    ]
    .join("\n")
}

/// Redacted user context.
#[derive(Serialize)]
struct ContextView {
    user_id: String,
    access_token_expiration: Option<DateTime<Utc>>,
    has_refresh_token: bool,
    updated_at: DateTime<Utc>,
}

impl From<&UserContext> for ContextView {
    fn from(c: &UserContext) -> Self {
        Self {
            user_id: c.user_id.clone(),
            access_token_expiration: c.api_access_tokens.access_token_expiration,
            has_refresh_token: !c.api_access_tokens.refresh_token.is_empty(),
            updated_at: c.updated_at,
        }
    }
}

#[derive(Tabled)]
struct ContextRow {
    #[tabled(rename = "User")]
    user_id: String,
    #[tabled(rename = "Token Expires")]
    expires: String,
    #[tabled(rename = "Refresh")]
    refresh: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

fn context_row(c: &ContextView) -> ContextRow {
    ContextRow {
        user_id: c.user_id.clone(),
        expires: c
            .access_token_expiration
            .map_or_else(|| "-".into(), |t| t.to_rfc3339()),
        refresh: if c.has_refresh_token { "yes" } else { "no" }.into(),
        updated_at: c.updated_at.to_rfc3339(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = Resolved::load(global);

    match args.command {
        AuthCommand::Url => {
            let auth = config::resolve_auth_config(&resolved, global)?;
            let manager = AuthSessionManager::new(
                auth.build_provider()?,
                MemoryUserContextStore::new(),
                auth.session_codec()?,
            );
            let (url, state) = manager.authorization_url();
            output::print_output(url.as_str(), global.quiet);
            output::notice(
                &format!(
                    "Open the URL above, sign in, then run:\n  vreeda auth sign-in --code <code>\n\
                     The callback's `state` parameter should read: {state}"
                ),
                global.quiet,
            );
            Ok(())
        }

        AuthCommand::SignIn { code } => {
            let auth = config::resolve_auth_config(&resolved, global)?;
            // The session token alone is enough to proceed.
            let path = resolved.contexts_path();
            let store = match RedbUserContextStore::open(&path) {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "user context store unavailable");
                    None
                }
            };
            let manager =
                AuthSessionManager::new(auth.build_provider()?, store, auth.session_codec()?);

            let signed = manager.sign_in(&code).await?;
            let path = config::store_session(&resolved, &signed.token)?;
            output::notice(
                &format!("Signed in. Session saved to {}", path.display()),
                global.quiet,
            );
            print_session(&SessionView::from(&signed.session), global)
        }

        AuthCommand::Whoami => {
            let token = config::read_session(&resolved)?;
            let session = config::session_codec(&resolved)?.decode(token.trim())?;
            print_session(&SessionView::from(&session), global)
        }

        AuthCommand::SignOut => {
            let path = resolved.session_path();
            match std::fs::remove_file(&path) {
                Ok(()) => output::notice("Signed out", global.quiet),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    output::notice("No stored session", global.quiet);
                }
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }

        AuthCommand::Contexts => {
            let store =
                RedbUserContextStore::open(resolved.contexts_path()).map_err(CoreError::from)?;
            let contexts = store.list().await.map_err(CoreError::from)?;
            let views: Vec<ContextView> = contexts.iter().map(ContextView::from).collect();
            let out = output::render_list(
                &global.output,
                &views,
                context_row,
                |c| c.user_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn print_session(view: &SessionView, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, view, session_detail, |s| {
        s.user_id.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
