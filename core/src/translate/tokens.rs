use crate::config::CHARS_PER_TOKEN;

/// Character-count approximation of the remote service's token usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimator {
    chars_per_token: usize,
}

impl TokenEstimator {
    pub const fn new(chars_per_token: usize) -> Self {
        Self { chars_per_token }
    }

    /// Rounds up so a batch never looks cheaper than it is. A ratio of zero
    /// counts every character as one token.
    pub fn estimate(&self, text: &str) -> usize {
        let chars = text.chars().count();
        if self.chars_per_token == 0 {
            chars
        } else {
            chars.div_ceil(self.chars_per_token)
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(CHARS_PER_TOKEN)
    }
}
