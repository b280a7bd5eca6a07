//! 命令行入口
//!
//! 读取 HTML，切换到指定语言，可选地注入新片段并等待增量翻译，输出结果。

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use live_translate::env::{core::LogLevel, generate_env_docs, EnvVar};
use live_translate::translation::{
    ConfigManager, IncrementalOutcome, LiveDocument, SwitchOutcome, TranslationConfig,
    TranslationError, TranslationResult, TranslationSession, LANGUAGES,
};

#[derive(Parser, Debug)]
#[command(
    name = "live-translate",
    version,
    about = "Translate an HTML document incrementally, with cache and lossless restore"
)]
struct Cli {
    /// HTML file to translate, or "-" to read stdin
    #[arg(required_unless_present_any = ["list_languages", "env_docs", "write_config"])]
    input: Option<String>,

    /// Target language code (see --list-languages)
    #[arg(short, long)]
    lang: Option<String>,

    /// HTML fragment appended to <body> after the switch; may be repeated
    #[arg(short, long = "inject", value_name = "HTML")]
    inject: Vec<String>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print supported languages and exit
    #[arg(long)]
    list_languages: bool,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_docs: bool,

    /// Write a configuration file with default values and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the translation endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// On-disk cache database file
    #[arg(long)]
    cache: Option<String>,

    /// Charset of the input document
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        LogLevel::get().unwrap_or_else(|_| "info".to_string())
    };
    let filter = EnvFilter::try_new(format!("live_translate={}", level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

fn print_languages() {
    for lang in LANGUAGES {
        println!(
            "{:<6} {:<22} {} ({})",
            lang.code,
            lang.name,
            lang.display_label(),
            lang.direction()
        );
    }
}

fn load_config(cli: &Cli) -> TranslationResult<TranslationConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(api_url) = &cli.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(cache) = &cli.cache {
        config.cache_path = Some(cache.clone());
    }
    config.validate()?;

    Ok(config)
}

fn read_input(input: &str) -> TranslationResult<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        return Ok(data);
    }

    fs::read(input).map_err(|e| {
        TranslationError::InvalidInput(format!("无法读取输入文件 {}: {}", input, e))
    })
}

async fn run(cli: Cli) -> TranslationResult<()> {
    let config = load_config(&cli)?;
    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| TranslationError::InvalidInput("缺少输入文件".to_string()))?;

    let data = read_input(input)?;
    let document = LiveDocument::from_bytes(&data, &cli.encoding)?;
    let mut session = TranslationSession::open(config, document)?;

    session.start().await?;

    if let Some(lang) = &cli.lang {
        match session.switch_language(lang).await? {
            SwitchOutcome::Unchanged => tracing::info!("已是 {}，无需切换", lang),
            SwitchOutcome::Restored(report) | SwitchOutcome::Applied(report) => {
                tracing::info!("{}: 写回 {} 处", session.label(), report.applied)
            }
            SwitchOutcome::Stale => tracing::warn!("切换结果已过期"),
        }
    }

    if !cli.inject.is_empty() {
        let body = session
            .document()
            .body()
            .ok_or_else(|| TranslationError::InvalidInput("文档没有 <body>".to_string()))?;
        for fragment in &cli.inject {
            session.document_mut().append_html(&body, fragment)?;
        }

        if let IncrementalOutcome::Applied(report) = session.settle().await {
            tracing::info!("增量翻译写回 {} 处", report.applied);
        }
    }

    let stats = session.client().stats();
    tracing::debug!(
        "缓存命中 {}，未命中 {}，请求 {}，失败分块 {}",
        stats.cache_hits,
        stats.cache_misses,
        stats.requests_sent,
        stats.failed_chunks
    );

    let output = session.document().serialize()?;
    match &cli.output {
        Some(path) => fs::write(path, output)?,
        None => io::stdout().write_all(&output)?,
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if cli.list_languages {
        print_languages();
        return;
    }
    if cli.env_docs {
        print!("{}", generate_env_docs());
        return;
    }
    if let Some(path) = &cli.write_config {
        if let Err(e) = ConfigManager::generate_example_config(path) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
