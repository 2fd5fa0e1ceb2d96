//! Block-wise system prompt assembly.
//!
//! [`SystemPromptBuilder`] joins a preamble and any number of blocks with
//! blank lines. Empty blocks are skipped.

/// Builder for multi-block system prompts.
///
/// # Example
///
/// ```
/// use meeple::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new("너는 보드게임 추천 도우미야.")
///     .raw("[카탄]\n자원을 모아 교역한다.")
///     .raw("")
///     .lines(["반드시 목록 안에서만 추천해.", "추천 완료!"])
///     .build();
///
/// assert!(prompt.starts_with("너는 보드게임 추천 도우미야.\n\n[카탄]"));
/// assert!(prompt.ends_with("반드시 목록 안에서만 추천해.\n추천 완료!"));
/// ```
pub struct SystemPromptBuilder {
    blocks: Vec<String>,
}

impl SystemPromptBuilder {
    /// Start with a preamble block, included as-is.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            blocks: vec![preamble.into()],
        }
    }

    /// Append a block of raw text. Skipped if empty.
    pub fn raw(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.blocks.push(content);
        }
        self
    }

    /// Append one block made of single-newline-separated lines.
    pub fn lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self.raw(joined)
    }

    /// Join all blocks with blank lines.
    pub fn build(self) -> String {
        self.blocks.join("\n\n")
    }
}
