use std::time::Duration;

use log::debug;

use crate::error::Result;
use crate::tools::{self, StdoutMode};

/// What the LLM is told about the video, piped to it on stdin
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub language: &'a str,
    pub title: &'a str,
    pub content: &'a str,
}

impl PromptContext<'_> {
    pub fn render(&self) -> String {
        format!(
            "You are a helpful assistant that answers questions about YouTube videos.\n\
\n\
Write your answer in {language}.\n\
\n\
Title: {title}\n\
Content:\n\
{content}\n\
\n\
defaults:\n  language: {language}\n",
            language = self.language,
            title = self.title,
            content = self.content,
        )
    }
}

/// Options passed through to `llm prompt`
#[derive(Debug, Clone, Default)]
pub struct LlmOptions {
    pub language: String,
    pub template: Option<String>,
}

/// Arguments for `llm prompt`, question first.
pub fn prompt_args<'a>(question: &'a str, options: &'a LlmOptions) -> Vec<&'a str> {
    let mut args = vec!["prompt", question, "-p", "language", options.language.as_str()];
    if let Some(template) = options.template.as_deref() {
        args.extend(["-t", template]);
    }
    args
}

/// Ask `question` about the video. The answer streams straight to stdout.
pub async fn ask(context: &PromptContext<'_>, question: &str, options: &LlmOptions, timeout: Duration) -> Result<()> {
    let prompt = context.render();
    debug!("Sending {} byte prompt to {} (template: {:?})", prompt.len(), tools::LLM, options.template);

    tools::run_tool(
        tools::LLM,
        &prompt_args(question, options),
        Some(&prompt),
        StdoutMode::Inherit,
        timeout,
    )
    .await?;
    Ok(())
}
