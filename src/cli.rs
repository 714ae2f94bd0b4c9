use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "qv",
    about = "Ask questions about a YouTube video using its subtitles",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL (https://www.youtube.com/watch?v=ID or https://youtu.be/ID)
    pub url: String,

    /// Question to ask about the video
    pub question: Option<String>,

    /// Set an LLM option (only `language` is supported), e.g. -p language English
    #[arg(short = 'p', num_args = 2, value_names = ["PARAM", "VALUE"])]
    pub param: Option<Vec<String>>,

    /// Save cleaned subtitles to FILE (also accepted as -sub)
    #[arg(long = "sub", value_name = "FILE")]
    pub sub: Option<PathBuf>,

    /// LLM prompt template to use
    #[arg(short, long)]
    pub template: Option<String>,

    /// Only print the subtitles, skip the LLM
    #[arg(long)]
    pub text_only: bool,

    /// Show video ID, cache state and config details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Target language from `-p language <value>`; the last one given wins.
    ///
    /// Any parameter other than `language` is an error naming it.
    pub fn language(&self) -> Result<Option<&str>, String> {
        let mut language = None;
        for pair in self.param.as_deref().unwrap_or_default().chunks(2) {
            match pair {
                [name, value] if name == "language" => language = Some(value.as_str()),
                [name, ..] => return Err(name.clone()),
                [] => {}
            }
        }
        Ok(language)
    }
}

/// Rewrite the single-dash `-sub` spelling to `--sub` so clap accepts it.
pub fn normalize_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            if arg == "-sub" {
                "--sub".to_string()
            } else if let Some(value) = arg.strip_prefix("-sub=") {
                format!("--sub={value}")
            } else {
                arg
            }
        })
        .collect()
}
