//! Built-in bot commands — instant canned replies, no provider call and
//! no token charge.


use chrono::{DateTime, Utc};
use florence_core::config::PaymentConfig;
use florence_memory::User;

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub payment: &'a PaymentConfig,
    pub low_balance_threshold: i64,
    pub now: DateTime<Utc>,
}

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    About,
    Tokens,
    Streak,
    Payments,
    Help,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/`
    /// prefixes (which pass through to the provider as prompts).
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/help@florence_bot" → "/help").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/start" => Some(Self::Start),
            "/about" => Some(Self::About),
            "/tokens" => Some(Self::Tokens),
            "/streak" => Some(Self::Streak),
            "/payments" => Some(Self::Payments),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Handle a command, mutating the user record where the command calls for
/// it, and return the reply text. The caller persists the record.
pub fn handle(cmd: Command, user: &mut User, ctx: &CommandContext<'_>) -> String {
    match cmd {
        Command::Start => {
            user.history.clear();
            format!(
                "Hello {}, welcome to Florence*! What do you need help with today?\n\n\
                 You have {} tokens.",
                user.first_name(),
                user.tokens
            )
        }
        Command::About => {
            "Florence* is the educational assistant at your fingertips. \
             Send a question on any subject and get answers immediately."
                .to_string()
        }
        Command::Tokens => {
            let mut reply = format!(
                "Hey {}, you have {} tokens.",
                user.first_name(),
                user.tokens
            );
            if user.tokens <= ctx.low_balance_threshold {
                reply.push_str(
                    "\n\nYou are running low on tokens. Top up by sending /payments.",
                );
            }
            reply
        }
        Command::Streak => format!(
            "Hey {}, you are on a {}-day streak. Send one prompt a day to keep it going!",
            user.first_name(),
            user.streak_count
        ),
        Command::Payments => {
            user.pending_payment_at = Some(ctx.now);
            format!(
                "{} Make your payments here:\n\n{}\n\n\
                 then send the proof of payment (documents only) to get your tokens.",
                ctx.payment.price_line, ctx.payment.payment_link
            )
        }
        Command::Help => "Here are a few helpful commands:\n\n\
             /start - Florence* is now listening to you.\n\
             /about - for more about Florence*.\n\
             /tokens - see how many tokens you have left.\n\
             /streak - see your streak.\n\
             /payments - Top up your tokens* in a click.\n\n\
             Every other message will be considered a prompt."
            .to_string(),
    }
}
