//! Gateway — the main event loop connecting channels, the user store, the
//! token economy, and the LLM provider.

mod pipeline;


use florence_core::{
    config::Config,
    message::{IncomingMessage, MessageMetadata, OutgoingMessage},
    traits::{Channel, Clock, DocumentExtractor, Provider, SystemClock},
};
use florence_economy::{PaymentVerifier, StreakPolicy, TokenPolicy};
use florence_memory::UserStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// The central gateway that routes messages between channels, per-user
/// state, and the provider.
pub struct Gateway {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) store: Arc<dyn UserStore>,
    pub(super) extractor: Arc<dyn DocumentExtractor>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) tokens: TokenPolicy,
    pub(super) streaks: StreakPolicy,
    pub(super) verifier: PaymentVerifier,
    pub(super) config: Config,
    /// Tracks senders with an event in flight. New messages from the same
    /// sender are buffered here, so per-user state mutation is serialized.
    pub(super) active_senders: Mutex<HashMap<String, Vec<IncomingMessage>>>,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        provider: Arc<dyn Provider>,
        channels: HashMap<String, Arc<dyn Channel>>,
        store: Arc<dyn UserStore>,
        extractor: Arc<dyn DocumentExtractor>,
        config: Config,
    ) -> Self {
        Self::with_clock(provider, channels, store, extractor, config, Arc::new(SystemClock))
    }

    /// Create a gateway with an injected clock, so temporal rules can be
    /// driven from tests.
    pub fn with_clock(
        provider: Arc<dyn Provider>,
        channels: HashMap<String, Arc<dyn Channel>>,
        store: Arc<dyn UserStore>,
        extractor: Arc<dyn DocumentExtractor>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            channels,
            store,
            extractor,
            clock,
            tokens: TokenPolicy::new(config.economy.clone()),
            streaks: StreakPolicy::new(config.economy.clone()),
            verifier: PaymentVerifier::new(&config.payment),
            config,
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Florence gateway running | provider: {} | channels: {}",
            self.provider.name(),
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.dispatch_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Dispatch a message: buffer if the sender already has an event in
    /// flight, otherwise process. This is the per-user critical section —
    /// check-balance → charge → provider call → commit or refund never
    /// interleaves for the same sender.
    pub(super) async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                buffer.push(incoming);
                info!("buffered message from {sender_key} (event in flight)");
                return;
            }
            active.insert(sender_key.clone(), Vec::new());
        }

        self.handle_message(&incoming).await;

        // Drain any messages buffered while we were busy.
        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                match active.get_mut(&sender_key) {
                    Some(buf) if !buf.is_empty() => Some(buf.remove(0)),
                    _ => {
                        active.remove(&sender_key);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message from {sender_key}");
                    self.handle_message(&buffered).await;
                }
                None => break,
            }
        }
    }

    /// Graceful shutdown: stop all channels.
    async fn shutdown(&self) {
        info!("Shutting down...");
        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }
        info!("Shutdown complete.");
    }

    /// Send a plain text reply back to the sender. Best-effort: delivery
    /// failures are logged, never propagated.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            metadata: MessageMetadata::default(),
            reply_target: incoming.reply_target.clone(),
        };

        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send message: {e}");
            }
        }
    }

    /// Notify configured operator targets ("channel:target") that a new
    /// user joined. Best-effort.
    pub(super) async fn notify_operators(&self, display_name: &str, sender_id: &str) {
        let note = format!("A new user, {display_name} ({sender_id}) has joined Florence*.");

        for target in &self.config.notify.operator_targets {
            let Some((channel_name, reply_target)) = target.split_once(':') else {
                warn!("malformed operator target '{target}', expected channel:target");
                continue;
            };
            let Some(channel) = self.channels.get(channel_name) else {
                warn!("operator target '{target}' names an unknown channel");
                continue;
            };
            let msg = OutgoingMessage {
                text: note.clone(),
                metadata: MessageMetadata::default(),
                reply_target: Some(reply_target.to_string()),
            };
            if let Err(e) = channel.send(msg).await {
                warn!("failed to notify operator {target}: {e}");
            }
        }
    }
}
