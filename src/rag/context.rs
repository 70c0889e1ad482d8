// Example block builder for style-consistent drafting prompts
use serde::{Deserialize, Serialize};

use crate::rag::retrieval::RetrievedItem;

/// Heading the drafting prompt expects above the examples
pub const EXAMPLE_BLOCK_HEADING: &str = "Reference these examples for consistency:";

/// Example block configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleBlockConfig {
    /// Maximum number of example lines
    pub max_examples: usize,
    /// Maximum characters of example text, heading excluded
    pub max_chars: usize,
    /// Layout of the example lines
    pub format: ExampleFormat,
}

impl Default for ExampleBlockConfig {
    fn default() -> Self {
        Self {
            max_examples: 5,
            max_chars: 1200,
            format: ExampleFormat::Bulleted,
        }
    }
}

/// Layout of the example lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleFormat {
    /// `- text`
    Bulleted,
    /// `1. text`
    Numbered,
    /// One paragraph per example with score and metadata
    Structured,
}

/// Rendered example block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleBlock {
    /// Heading plus examples; empty when nothing was included
    pub text: String,
    pub example_count: usize,
    /// Ids of the included lines, in order
    pub sids: Vec<String>,
}

impl ExampleBlock {
    pub fn is_empty(&self) -> bool {
        self.example_count == 0
    }
}

/// Renders retrieved lines into a prompt block
pub struct ExampleBlockBuilder {
    config: ExampleBlockConfig,
}

impl ExampleBlockBuilder {
    pub fn new() -> Self {
        Self {
            config: ExampleBlockConfig::default(),
        }
    }

    pub fn with_config(config: ExampleBlockConfig) -> Self {
        Self { config }
    }

    /// Build the block from ranked items, stopping at the first line that
    /// would overflow `max_chars`
    pub fn build(&self, items: &[RetrievedItem]) -> ExampleBlock {
        let mut lines = Vec::new();
        let mut sids = Vec::new();
        let mut used_chars = 0;

        for item in items
            .iter()
            .filter(|item| !item.text.trim().is_empty())
            .take(self.config.max_examples)
        {
            let line = self.format_item(lines.len() + 1, item);
            let line_chars = line.chars().count();
            if used_chars + line_chars > self.config.max_chars {
                break;
            }
            used_chars += line_chars;
            lines.push(line);
            sids.push(item.sid.clone());
        }

        if lines.is_empty() {
            return ExampleBlock {
                text: String::new(),
                example_count: 0,
                sids,
            };
        }

        let separator = match self.config.format {
            ExampleFormat::Structured => "\n\n",
            _ => "\n",
        };

        ExampleBlock {
            text: format!("{}\n{}", EXAMPLE_BLOCK_HEADING, lines.join(separator)),
            example_count: lines.len(),
            sids,
        }
    }

    fn format_item(&self, index: usize, item: &RetrievedItem) -> String {
        let text = item.text.trim();
        match self.config.format {
            ExampleFormat::Bulleted => format!("- {}", text),
            ExampleFormat::Numbered => format!("{}. {}", index, text),
            ExampleFormat::Structured => {
                let tags: Vec<String> = item
                    .metadata
                    .iter()
                    .filter_map(|(key, value)| value.as_ref().map(|v| format!("{}={}", key, v)))
                    .collect();
                if tags.is_empty() {
                    format!("Example {} (score: {:.2})\n  {}", index, item.score, text)
                } else {
                    format!(
                        "Example {} (score: {:.2}, {})\n  {}",
                        index,
                        item.score,
                        tags.join(", "),
                        text
                    )
                }
            }
        }
    }

    pub fn config(&self) -> &ExampleBlockConfig {
        &self.config
    }
}

impl Default for ExampleBlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}
