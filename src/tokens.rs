use crate::models::Deployment;
use anyhow::{bail, Result};
use tiktoken_rs::CoreBPE;

/// Tokens held back from the window to absorb encoder inaccuracy.
pub const RESERVED_TOKENS: u32 = 200;

/// Computes how many tokens are left for the completion after the prompt.
pub struct TokenBudget {
    deployment: Deployment,
    window: u32,
    encoder: CoreBPE,
}

impl TokenBudget {
    /// `max_tokens_override` replaces the deployment's window when it is
    /// non-zero and does not exceed it; larger values are clamped.
    pub fn new(deployment: Deployment, max_tokens_override: Option<u32>) -> Result<Self> {
        let encoder = if deployment.is_chat() {
            tiktoken_rs::cl100k_base()?
        } else {
            tiktoken_rs::p50k_base()?
        };
        Ok(Self { deployment, window: window_size(deployment, max_tokens_override), encoder })
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn count(&self, text: &str) -> usize {
        self.encoder.encode_with_special_tokens(text).len()
    }

    /// Remaining completion tokens for `text`, or an error when nothing is left.
    pub fn remaining(&self, text: &str) -> Result<u32> {
        let used = self.count(text) as i64 + RESERVED_TOKENS as i64;
        let left = self.window as i64 - used;
        if left <= 0 {
            bail!(
                "prompt too large for {}: {} tokens used of a {} token window",
                self.deployment,
                used,
                self.window
            );
        }
        tracing::info!(deployment = %self.deployment, window = self.window, used, left, "token budget");
        Ok(left as u32)
    }
}

pub fn window_size(deployment: Deployment, max_tokens_override: Option<u32>) -> u32 {
    let limit = deployment.max_tokens();
    match max_tokens_override {
        Some(m) if m > 0 && m <= limit => m,
        _ => limit,
    }
}
