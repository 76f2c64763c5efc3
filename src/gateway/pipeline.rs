//! Per-message processing pipeline: resolve user, grant check, command
//! dispatch, payment-proof verification, and the charged prompt path.

use super::Gateway;
use crate::commands::{self, Command, CommandContext};
use chrono::{DateTime, Utc};
use florence_core::{
    context::{Context, MediaPart},
    error::FlorenceError,
    message::{ContentKind, IncomingMessage},
};
use florence_economy::{ChargeRefusal, StreakOutcome};
use florence_memory::User;
use tracing::{error, info, warn};

const APOLOGY: &str =
    "Sorry, something went wrong while processing your message. Your tokens were not spent. \
     Please try again in a moment.";

impl Gateway {
    /// Process one inbound event end to end. Never panics and never
    /// propagates: any unexpected failure becomes a single apology reply.
    pub(super) async fn handle_message(&self, incoming: &IncomingMessage) {
        if let Err(e) = self.process(incoming).await {
            error!(
                "failed to process message from {}:{}: {e}",
                incoming.channel, incoming.sender_id
            );
            // Best-effort apology; a failure here is swallowed.
            self.send_text(incoming, APOLOGY).await;
        }
    }

    async fn process(&self, incoming: &IncomingMessage) -> Result<(), FlorenceError> {
        let now = self.clock.now();
        let display_name = incoming
            .sender_name
            .clone()
            .unwrap_or_else(|| "there".to_string());

        let (mut user, created) = self
            .store
            .get_or_create(
                &incoming.sender_id,
                &display_name,
                self.config.economy.starting_tokens,
                now,
            )
            .await?;

        // A brand-new user gets the walkthrough and nothing else; the
        // creation event is not charged or forwarded.
        if created {
            info!("new user {} on {}", incoming.sender_id, incoming.channel);
            self.send_text(incoming, &welcome_message(user.tokens)).await;
            self.notify_operators(&user.display_name, &user.sender_id).await;
            return Ok(());
        }

        let granted = self.tokens.periodic_grant(now, user.tokens, user.last_grant_at);
        if granted > 0 {
            user.tokens += granted;
            user.last_grant_at = now;
            self.store.update(&user).await?;
            self.send_text(
                incoming,
                &format!("You've earned {granted} tokens for staying active! 🎉"),
            )
            .await;
        }

        if incoming.content == ContentKind::Text {
            if let Some(cmd) = Command::parse(&incoming.text) {
                let ctx = CommandContext {
                    payment: &self.config.payment,
                    low_balance_threshold: self.tokens.low_balance_threshold(),
                    now,
                };
                let reply = commands::handle(cmd, &mut user, &ctx);
                self.store.update(&user).await?;
                self.send_text(incoming, &reply).await;
                return Ok(());
            }
        }

        if incoming.content == ContentKind::Document && user.pending_payment_at.is_some() {
            return self.handle_payment_proof(incoming, &mut user).await;
        }

        self.handle_prompt(incoming, &mut user, now).await
    }

    /// Verify a document as proof of payment. Bypasses the generic content
    /// charge entirely.
    async fn handle_payment_proof(
        &self,
        incoming: &IncomingMessage,
        user: &mut User,
    ) -> Result<(), FlorenceError> {
        let Some(attachment) = incoming.attachments.first() else {
            self.send_text(incoming, "Please send the proof of payment as a document.")
                .await;
            return Ok(());
        };

        self.send_text(incoming, "Verifying payment proof...").await;

        let channel = self
            .channels
            .get(&incoming.channel)
            .ok_or_else(|| FlorenceError::Channel(format!("unknown channel {}", incoming.channel)))?;

        let text = match channel.fetch_attachment(attachment).await {
            Ok(bytes) => match self.extractor.extract_text(&bytes).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("payment proof extraction failed for {}: {e}", user.sender_id);
                    self.send_text(
                        incoming,
                        "Error processing payment proof. Please try again or contact support.",
                    )
                    .await;
                    return Ok(());
                }
            },
            Err(e) => {
                warn!("payment proof download failed for {}: {e}", user.sender_id);
                self.send_text(
                    incoming,
                    "Error processing payment proof. Please try again or contact support.",
                )
                .await;
                return Ok(());
            }
        };

        let verification = self.verifier.verify(&text, user.pending_payment_at);

        if verification.valid {
            user.tokens += self.config.payment.bundle_tokens;
            user.pending_payment_at = None;
            self.store.update(user).await?;
            info!(
                "payment verified for {} (dated {:?})",
                user.sender_id, verification.matched_date
            );
            self.send_text(
                incoming,
                &format!(
                    "Payment verified! {} tokens have been added to your account.",
                    self.config.payment.bundle_tokens
                ),
            )
            .await;
        } else {
            let reason = verification.reason.unwrap_or("unknown");
            self.send_text(
                incoming,
                &format!("Payment verification failed: {reason}."),
            )
            .await;
        }
        Ok(())
    }

    /// The charged content path: guard, charge, streak, provider call,
    /// history append. A provider failure refunds the charge.
    async fn handle_prompt(
        &self,
        incoming: &IncomingMessage,
        user: &mut User,
        now: DateTime<Utc>,
    ) -> Result<(), FlorenceError> {
        let charge = match self.tokens.evaluate_charge(
            incoming.content,
            incoming.attachments.len(),
            user.tokens,
        ) {
            Ok(charge) => charge,
            Err(refusal) => {
                self.send_text(incoming, refusal_reply(refusal)).await;
                return Ok(());
            }
        };

        user.tokens -= charge;

        match self
            .streaks
            .evaluate(now, user.streak_count, user.streak_date, user.last_activity_at)
        {
            StreakOutcome::Broken => {
                user.streak_count = 0;
                user.streak_date = now;
            }
            StreakOutcome::Advanced { count, reward } => {
                user.streak_count = count;
                user.streak_date = now;
                if reward > 0 {
                    user.tokens += reward;
                    self.send_text(
                        incoming,
                        &format!(
                            "🔥 Congratulations! You've maintained a {count}-day streak! \
                             You've earned {reward} bonus tokens! 🎉"
                        ),
                    )
                    .await;
                }
            }
            StreakOutcome::Unchanged => {}
        }

        user.last_activity_at = now;
        self.store.update(user).await?;

        let context = self.build_context(incoming, user).await;

        let context = match context {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("failed to prepare prompt for {}: {e}", user.sender_id);
                self.refund(incoming, user, charge).await;
                return Ok(());
            }
        };

        match self.provider.complete(&context).await {
            Ok(response) => {
                user.history.push_exchange(
                    &context.current_message,
                    &response.text,
                    self.config.history.max_history_turns,
                );
                if let Err(e) = self.store.update(user).await {
                    // The charge was committed before the provider call;
                    // a failed commit of the exchange still refunds it.
                    warn!("failed to commit exchange for {}: {e}", user.sender_id);
                    self.refund(incoming, user, charge).await;
                    return Ok(());
                }
                self.send_text(incoming, &response.text).await;
                Ok(())
            }
            Err(e) => {
                warn!("provider call failed for {}: {e}", user.sender_id);
                self.refund(incoming, user, charge).await;
                Ok(())
            }
        }
    }

    /// Restore a charge after an upstream failure, then apologize.
    /// Best-effort: if the store refuses even the refund write, that is
    /// logged and the apology still goes out.
    async fn refund(&self, incoming: &IncomingMessage, user: &mut User, charge: i64) {
        user.tokens += charge;
        if let Err(e) = self.store.update(user).await {
            error!("failed to persist refund for {}: {e}", user.sender_id);
        }
        self.send_text(incoming, APOLOGY).await;
    }

    /// Assemble the provider request: system prompt, recent history, the
    /// current message, and any image bytes.
    async fn build_context(
        &self,
        incoming: &IncomingMessage,
        user: &User,
    ) -> Result<Context, FlorenceError> {
        let mut text = incoming.text.clone();
        let mut media = Vec::new();

        match incoming.content {
            ContentKind::Image => {
                let channel = self.channels.get(&incoming.channel).ok_or_else(|| {
                    FlorenceError::Channel(format!("unknown channel {}", incoming.channel))
                })?;
                for attachment in &incoming.attachments {
                    let bytes = channel.fetch_attachment(attachment).await?;
                    media.push(MediaPart {
                        media_type: attachment
                            .mime_type
                            .clone()
                            .unwrap_or_else(|| "image/jpeg".to_string()),
                        data: bytes,
                    });
                }
                if text.is_empty() {
                    text = "Please analyze this attachment.".to_string();
                }
            }
            ContentKind::Document => {
                // A document outside the payment flow is read as text and
                // folded into the prompt.
                let channel = self.channels.get(&incoming.channel).ok_or_else(|| {
                    FlorenceError::Channel(format!("unknown channel {}", incoming.channel))
                })?;
                let attachment = incoming.attachments.first().ok_or_else(|| {
                    FlorenceError::Channel("document message without attachment".to_string())
                })?;
                let bytes = channel.fetch_attachment(attachment).await?;
                let contents = self.extractor.extract_text(&bytes).await?;
                let question = if text.is_empty() {
                    "Please analyze this attachment.".to_string()
                } else {
                    text
                };
                text = format!("{question}\n\nDocument contents:\n{contents}");
            }
            ContentKind::Text | ContentKind::Other => {}
        }

        Ok(Context {
            system_prompt: florence_core::context::default_system_prompt(),
            history: user
                .history
                .recent(self.config.history.max_context_turns)
                .to_vec(),
            current_message: text,
            media,
        })
    }
}

/// First-contact walkthrough, sent exactly once per user.
fn welcome_message(tokens: i64) -> String {
    format!(
        "Hello there! Welcome to Florence*, your educational assistant at your fingertips.\n\n\
         Interacting with Florence* costs you *tokens**. Every now and then you'll get these, \
         but you can also purchase more of them at any time.\n\n\
         You currently have {tokens} tokens*. Feel free to send your text (one token*), \
         images (two tokens*), or documents (two tokens*) and get answers immediately.\n\n\
         Here are a few helpful commands for a smooth experience:\n\n\
         /start - Florence* is now listening to you.\n\
         /about - for more about Florence*.\n\
         /tokens - see how many tokens you have left.\n\
         /streak - see your streak.\n\
         /payments - Top up your tokens* in a click.\n\n\
         *Please note:* Every other message will be considered a prompt."
    )
}

fn refusal_reply(refusal: ChargeRefusal) -> &'static str {
    match refusal {
        ChargeRefusal::InsufficientTokens => {
            "You've run out of tokens. Please purchase more using /payments"
        }
        ChargeRefusal::TooManyAttachments => {
            "Sorry, we can't handle that many images/documents right now. \
             Please send 5 or fewer at a time."
        }
        ChargeRefusal::UnsupportedContent => {
            "Sorry, this is a little too much for us to handle now. \
             Could you try simplifying your prompt?"
        }
    }
}
