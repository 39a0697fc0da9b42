//! Operator confirmation as an awaited decision.
//!
//! The policy never blocks on a prompt itself: it hands a
//! [`ConfirmRequest`] to a [`Confirmer`] and awaits the answer. A UI, a
//! terminal or a test script can sit behind the trait.

use crate::core::policy::ConfirmRequest;
use crate::ui::messages::warning;
use async_trait::async_trait;
use std::io::{self, Write};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Declined,
    /// Nobody answered (prompt closed, channel dropped).
    Cancelled,
}

impl Decision {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Decision::Confirmed)
    }
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> Decision;
}

/// Answers yes to everything (`--yes`).
pub struct AssumeYes;

#[async_trait]
impl Confirmer for AssumeYes {
    async fn confirm(&self, _request: &ConfirmRequest) -> Decision {
        Decision::Confirmed
    }
}

/// Answers no to everything; used when no operator can be asked.
pub struct AssumeNo;

#[async_trait]
impl Confirmer for AssumeNo {
    async fn confirm(&self, _request: &ConfirmRequest) -> Decision {
        Decision::Declined
    }
}

/// Ask a yes/no question on the terminal.
pub struct TerminalConfirmer;

fn ask_confirmation(prompt: &str) -> Decision {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => Decision::Cancelled,
        Ok(_) if matches!(s.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim") => {
            Decision::Confirmed
        }
        Ok(_) => Decision::Declined,
    }
}

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, request: &ConfirmRequest) -> Decision {
        let prompt = request.to_string();
        tokio::task::spawn_blocking(move || ask_confirmation(&prompt))
            .await
            .unwrap_or(Decision::Cancelled)
    }
}

/// A question waiting for its answer on the other side of a channel.
#[derive(Debug)]
pub struct PendingDecision {
    pub request: ConfirmRequest,
    reply: oneshot::Sender<bool>,
}

impl PendingDecision {
    pub fn answer(self, yes: bool) {
        // The asking side may already be gone; nothing to do then.
        let _ = self.reply.send(yes);
    }

    pub fn confirm(self) {
        self.answer(true)
    }
}

/// Confirmer that forwards each question over a channel. Dropping a
/// [`PendingDecision`] without answering cancels the flow that asked.
#[derive(Debug, Clone)]
pub struct ChannelConfirmer {
    tx: mpsc::Sender<PendingDecision>,
}

impl ChannelConfirmer {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PendingDecision>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Confirmer for ChannelConfirmer {
    async fn confirm(&self, request: &ConfirmRequest) -> Decision {
        let (reply, answer) = oneshot::channel();
        let pending = PendingDecision {
            request: request.clone(),
            reply,
        };
        if self.tx.send(pending).await.is_err() {
            return Decision::Cancelled;
        }
        match answer.await {
            Ok(true) => Decision::Confirmed,
            Ok(false) => Decision::Declined,
            Err(_) => Decision::Cancelled,
        }
    }
}
