use std::io;
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::Cli;
use qv::config::{Config, TransportKind};
use qv::fetch::Fetcher;
use qv::llm::{LlmOptions, PromptContext};
use qv::tools;
use qv::youtube::{CurlTransport, HttpTransport, SubtitleLocator, Transport, YtDlp};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("qv.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qv")
        .join("logs")
}

fn build_after_help() -> String {
    let tool_lines = [tools::YT_DLP, tools::CURL, tools::LLM]
        .iter()
        .map(|name| match tools::tool_version(name) {
            Some(v) => format!("  \x1b[32m✅\x1b[0m {name:<10} {v}"),
            None => format!("  \x1b[31m❌\x1b[0m {name:<10} (not found)"),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let log_path = log_dir().join("qv.log");

    format!(
        "\nREQUIRED TOOLS:\n{tool_lines}\n\nCache: {}\nLogs are written to: {}",
        Config::default().cache_dir().display(),
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches_from(cli::normalize_args(std::env::args()));
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        debug!("Ignoring config: {e}");
        Config::default()
    });

    let language = match cli.language() {
        Ok(lang) => lang.unwrap_or(config.language()).to_string(),
        Err(param) => bail!("Unsupported parameter: {param}"),
    };
    let template = cli.template.clone().or_else(|| config.template.clone());
    let timeout = config.tool_timeout();

    let mut required = vec![tools::YT_DLP, tools::LLM];
    if config.transport() == TransportKind::Curl {
        required.push(tools::CURL);
    }
    tools::check_dependencies(&required)?;

    let video_id = qv::resolve(&cli.url)?;

    if cli.verbose {
        let config_path = qv::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Video: {video_id}\nLanguage: {language}");
    }

    if let Some(ref path) = cli.sub {
        if path.exists() && !qv::output::confirm_overwrite(path, &mut io::stdin().lock(), &mut io::stdout())? {
            println!("Operation canceled");
            return Ok(());
        }
    }

    let cache = qv::cache::SubtitleCache::with_ttl(config.cache_dir(), config.cache_ttl())?;
    let locator = YtDlp::new(config.subtitle_lang(), timeout);
    let transport: Box<dyn Transport> = match config.transport() {
        TransportKind::Curl => Box::new(CurlTransport::new(timeout)),
        TransportKind::Http => Box::new(HttpTransport::new(timeout)?),
    };

    let subs = Fetcher::new(&cache, &locator, transport.as_ref()).fetch(&cli.url).await?;

    if cli.verbose {
        eprintln!(
            "Cache: {} ({})\nCharacters: {}",
            cache.path_for(&subs.video_id).display(),
            if subs.from_cache { "hit" } else { "miss" },
            subs.text.chars().count(),
        );
    }
    if subs.is_short() {
        eprintln!("Warning: The retrieved content seems unusually short. Results might not be accurate.");
    }

    if let Some(ref path) = cli.sub {
        match qv::output::save_subtitles(path, &subs.text) {
            Ok(()) => println!("Subtitles saved to {}", path.display()),
            Err(e) => eprintln!("Error saving subtitles: {e}"),
        }
    }

    if cli.text_only {
        println!("{}", subs.text);
        return Ok(());
    }

    let question = match (cli.question.as_deref(), template.as_deref()) {
        (Some(q), _) => q,
        (None, Some(_)) => "",
        (None, None) => bail!("Either a question or template must be provided"),
    };

    let title = locator.title(&cli.url).await?;
    let context = PromptContext {
        language: &language,
        title: &title,
        content: &subs.text,
    };
    let options = LlmOptions {
        language: language.clone(),
        template,
    };

    println!("Processing your question...");
    qv::llm::ask(&context, question, &options, timeout).await?;

    Ok(())
}
