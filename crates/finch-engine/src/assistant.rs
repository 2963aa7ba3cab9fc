//! Conversational front end over the analysis pipeline.
//!
//! Routing is mode-driven: a greeting clears the active mode, otherwise the
//! user's stored mode decides whether the message is treated as a symbol
//! lookup, a canned mode reply, or general help. Every turn is persisted to
//! the conversation store before and after routing.

use std::sync::Arc;
use std::time::Duration;

use finch_models::{ChatRole, PromptStrategy, UserLevel};
use finch_store::ConversationStore;
use tracing::info;

use crate::analyzer::Analyzer;
use crate::error::EngineError;

/// A mode left idle this long falls back to greeting state.
const MODE_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Per-user session mode set by quick actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    StockSearch,
    Portfolio,
    News,
    Analysis,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::StockSearch => "stock_search",
            ChatMode::Portfolio => "portfolio",
            ChatMode::News => "news",
            ChatMode::Analysis => "analysis",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stock_search" => Some(ChatMode::StockSearch),
            "portfolio" => Some(ChatMode::Portfolio),
            "news" => Some(ChatMode::News),
            "analysis" => Some(ChatMode::Analysis),
            _ => None,
        }
    }
}

/// One chat turn's result.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
}

/// Company-name shorthand to ticker. Checked after the uppercase-ticker
/// scan so an explicit symbol always wins.
const COMPANY_KEYWORDS: &[(&str, &str)] = &[
    ("zomato", "ZOMATO"),
    ("reliance", "RELIANCE"),
    ("tcs", "TCS"),
    ("hdfc", "HDFCBANK"),
    ("infosys", "INFY"),
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("tesla", "TSLA"),
];

fn is_greeting(message: &str) -> bool {
    let trimmed = message
        .trim()
        .trim_end_matches(['!', '.', '?'])
        .to_lowercase();
    matches!(trimmed.as_str(), "hi" | "hello" | "hey")
}

/// Find a stock symbol in a chat message.
///
/// A word counts as an explicit ticker only when the user typed it in
/// uppercase (2-10 letters, optional .NS/.BO suffix). Lowercase company
/// names resolve through the keyword table.
pub fn detect_symbol(message: &str) -> Option<String> {
    for raw in message.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '.');
        let base = word
            .strip_suffix(".NS")
            .or_else(|| word.strip_suffix(".BO"))
            .unwrap_or(word);
        let is_ticker = (2..=10).contains(&base.len())
            && base.chars().all(|c| c.is_ascii_uppercase());
        if is_ticker {
            return Some(base.to_string());
        }
    }

    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    for (keyword, symbol) in COMPANY_KEYWORDS {
        if words.contains(keyword) {
            return Some((*symbol).to_string());
        }
    }
    None
}

pub struct Assistant {
    store: Arc<ConversationStore>,
    analyzer: Arc<Analyzer>,
    mode_idle_timeout: Duration,
}

impl Assistant {
    pub fn new(store: Arc<ConversationStore>, analyzer: Arc<Analyzer>) -> Self {
        Self {
            store,
            analyzer,
            mode_idle_timeout: MODE_IDLE_TIMEOUT,
        }
    }

    /// Override how long a session mode survives without activity.
    pub fn with_mode_idle_timeout(mut self, timeout: Duration) -> Self {
        self.mode_idle_timeout = timeout;
        self
    }

    /// The stored mode, or `None` once the user has gone idle. A stale
    /// mode is cleared in the store so the reset sticks.
    fn active_mode(&self, user_id: &str) -> Result<Option<ChatMode>, EngineError> {
        let Some(mode) = self
            .store
            .get_mode(user_id)?
            .as_deref()
            .and_then(ChatMode::parse)
        else {
            return Ok(None);
        };

        let idle_cutoff = chrono::Duration::from_std(self.mode_idle_timeout)
            .unwrap_or(chrono::Duration::MAX);
        let recent = self
            .store
            .last_activity(user_id)?
            .is_some_and(|last| chrono::Utc::now() - last < idle_cutoff);
        if recent {
            return Ok(Some(mode));
        }

        info!(user = %user_id, mode = ?mode, "Session idle, resetting mode");
        self.store.clear_mode(user_id)?;
        Ok(None)
    }

    /// Handle one chat message and persist both sides of the turn.
    pub async fn chat(
        &self,
        user_id: &str,
        conversation_id: &str,
        message: &str,
    ) -> Result<ChatReply, EngineError> {
        self.store
            .save_message(user_id, conversation_id, ChatRole::User, message)?;

        // Staleness is judged against the previous turn, so read the mode
        // before stamping this one.
        let mode = self.active_mode(user_id)?;
        self.store.touch_activity(user_id)?;
        info!(user = %user_id, mode = ?mode, "Routing chat message");

        let response = if is_greeting(message) {
            // A greeting always resets the session.
            self.store.clear_mode(user_id)?;
            "Hello! I'm your financial assistant. Pick a quick action or ask \
             me about a stock to get started."
                .to_string()
        } else {
            match mode {
                Some(ChatMode::StockSearch) => self.stock_search_reply(message).await?,
                Some(ChatMode::Portfolio) => {
                    "Portfolio mode is active. List your holdings and I can summarize \
                     their current prices."
                        .to_string()
                }
                Some(ChatMode::News) => {
                    "News mode is active. Ask about a specific stock to get its latest \
                     figures."
                        .to_string()
                }
                Some(ChatMode::Analysis) => self.analysis_reply(message).await?,
                None => {
                    "I'm here to help! Activate a mode with a quick action, or ask me \
                     about stocks and finance."
                        .to_string()
                }
            }
        };

        self.store
            .save_message(user_id, conversation_id, ChatRole::Model, &response)?;

        Ok(ChatReply {
            response,
            conversation_id: conversation_id.to_string(),
        })
    }

    /// Activate a session mode from a quick-action button.
    pub fn quick_action(&self, user_id: &str, action: &str) -> Result<String, EngineError> {
        let (mode, response) = match action {
            "stock-search" => (
                Some(ChatMode::StockSearch),
                "Stock search activated. Enter a stock symbol (e.g. RELIANCE, TCS, AAPL) \
                 to get live data.",
            ),
            "portfolio-review" => (
                Some(ChatMode::Portfolio),
                "Portfolio mode activated. List your holdings for a summary.",
            ),
            "market-analysis" => (
                Some(ChatMode::Analysis),
                "Analysis mode activated. Enter stock symbols for detailed analysis.",
            ),
            "news-update" => (
                Some(ChatMode::News),
                "News mode activated. Ask about specific stocks for their latest figures.",
            ),
            _ => (None, "Action completed successfully."),
        };

        match mode {
            // set_mode refreshes the activity stamp as well.
            Some(mode) => self.store.set_mode(user_id, Some(mode.as_str()))?,
            None => self.store.touch_activity(user_id)?,
        }
        Ok(response.to_string())
    }

    async fn stock_search_reply(&self, message: &str) -> Result<String, EngineError> {
        let Some(symbol) = detect_symbol(message) else {
            return Ok(
                "Please enter a valid stock symbol (e.g. RELIANCE, TCS, AAPL).".to_string(),
            );
        };
        let analysis = self
            .analyzer
            .analyze(PromptStrategy::Dynamic, &symbol, message, UserLevel::General)
            .await?;
        Ok(analysis.result)
    }

    async fn analysis_reply(&self, message: &str) -> Result<String, EngineError> {
        let Some(symbol) = detect_symbol(message) else {
            return Ok("Enter a stock symbol and I'll run a detailed analysis.".to_string());
        };
        let analysis = self
            .analyzer
            .analyze(
                PromptStrategy::ChainOfThought,
                &symbol,
                message,
                UserLevel::General,
            )
            .await?;
        Ok(analysis.result)
    }
}
