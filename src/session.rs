//! Client-side session state: a single-writer store over a watch channel.
//!
//! Every consumer of the current identity subscribes here instead of talking
//! to the auth sub-API directly; dropping the receiver is the unsubscribe.
//! Tokens survive between CLI invocations in a small JSON file, the terminal
//! analog of the browser's local storage.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::{
    gateway::Gateway,
    model::{Identity, SessionTokens},
};

/// Holds the current authenticated identity and the tokens behind it.
pub struct SessionStore {
    tx: watch::Sender<Option<Identity>>,
    tokens: Option<SessionTokens>,
    path: PathBuf,
}

impl SessionStore {
    /// Create an anonymous store persisting tokens at `path`.
    pub fn new(path: PathBuf) -> Self {
        let (tx, _) = watch::channel(None);
        SessionStore {
            tx,
            tokens: None,
            path,
        }
    }

    /// Subscribe to identity changes. The receiver immediately sees the
    /// current value; dropping it ends the subscription.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// The identity as of the last auth event, if signed in.
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Bearer token for gateway calls, present only while signed in.
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    /// Restore the session at startup: load persisted tokens and ask the
    /// gateway who they belong to. Any failure leaves the store anonymous
    /// without surfacing an error; the anonymous rendering path takes over.
    pub async fn refresh(&mut self, gateway: &Gateway) {
        let Some(tokens) = read_tokens(&self.path) else {
            self.tokens = None;
            self.tx.send_replace(None);
            return;
        };
        match gateway.current_user(&tokens.access_token).await {
            Ok(identity) if !identity.id.is_empty() => {
                self.tokens = Some(tokens);
                self.tx.send_replace(Some(identity));
            }
            _ => {
                self.tokens = None;
                self.tx.send_replace(None);
            }
        }
    }

    /// Record a successful sign-in: persist tokens and notify subscribers.
    pub fn signed_in(&mut self, tokens: SessionTokens, identity: Identity) -> Result<()> {
        let data = serde_json::to_string_pretty(&tokens)?;
        fs::write(&self.path, data)
            .with_context(|| format!("writing session file {}", self.path.display()))?;
        self.tokens = Some(tokens);
        self.tx.send_replace(Some(identity));
        Ok(())
    }

    /// Tear the session down: drop tokens, remove the file, notify.
    pub fn signed_out(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("removing session file {}", self.path.display()))?;
        }
        self.tokens = None;
        self.tx.send_replace(None);
        Ok(())
    }
}

/// Read persisted tokens, treating a missing or malformed file as signed out.
fn read_tokens(path: &PathBuf) -> Option<SessionTokens> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}
