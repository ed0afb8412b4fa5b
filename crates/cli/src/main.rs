use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use jaib_core::request::parse_article_url;
use jaib_core::{
    ExtractedArticle, ExtractionError, ExtractionRequest, Extractor, FetchConfig, JaibError, MarkdownConfig,
    OutputFormat, Readability, ReadabilityConfig, TextConfig, extract_article, fetch_file, fetch_stdin,
};
use owo_colors::OwoColorize;
use url::Url;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const STDIN: &str = "-";

/// Output format for the extracted article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format(OutputFormat);

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self(OutputFormat::Json)),
            "html" => Ok(Self(OutputFormat::Html)),
            "text" | "txt" => Ok(Self(OutputFormat::Text)),
            "markdown" | "md" => Ok(Self(OutputFormat::Markdown)),
            _ => Err(format!("Invalid format: {}. Valid options: json, html, text, markdown", s)),
        }
    }
}

/// Extract the readable article from a web page
#[derive(Parser, Debug)]
#[command(name = "jaib")]
#[command(version)]
#[command(about = "Extract the readable article, byline and lead image from a web page", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, "-" for stdin, or shared text containing a URL
    #[arg(value_name = "INPUT")]
    input: String,

    /// Address of the page when reading from a file or stdin; resolves relative links
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output format (json, html, text, markdown)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: Format,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Fetch timeout in milliseconds
    #[arg(long, default_value = "20000", value_name = "MS")]
    timeout_ms: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Minimum candidate score for a page to count as an article
    #[arg(long, default_value = "20", value_name = "SCORE")]
    min_score: f64,

    /// Strip images from output
    #[arg(long)]
    no_images: bool,

    /// Include TOML frontmatter (Markdown only)
    #[arg(long)]
    frontmatter: bool,

    /// Append a reference table with all links (Markdown only)
    #[arg(long)]
    references: bool,

    /// Print progress and article details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig { timeout: Duration::from_millis(self.timeout_ms), ..FetchConfig::default() };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    fn readability_config(&self) -> ReadabilityConfig {
        ReadabilityConfig::builder().min_score(self.min_score).preserve_images(!self.no_images).build()
    }
}

/// Where the HTML comes from.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Url(String),
    File(String),
    Stdin,
}

impl Input {
    /// URLs win, then existing files, then the first URL inside shared text.
    fn classify(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed == STDIN {
            Self::Stdin
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else if Path::new(input).exists() {
            Self::File(input.to_string())
        } else if let Ok(request) = ExtractionRequest::from_shared_text(input) {
            Self::Url(request.url)
        } else {
            Self::File(input.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let started = Instant::now();

    if args.verbose {
        echo::print_banner();
    }

    let article = match run(&args).await {
        Ok(article) => article,
        Err(err) => {
            echo::print_failure(&err);
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.verbose {
        echo::print_article_details(&article);
    }

    let output = render(&article, &args).context("Failed to render article")?;

    match &args.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", output),
    }

    if args.verbose {
        echo::print_timing("Total", started.elapsed());
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(args: &Args) -> Result<ExtractedArticle, ExtractionError> {
    match Input::classify(&args.input) {
        Input::Url(url) => {
            if args.verbose {
                echo::print_step(1, 2, &format!("Fetching {}", url.bright_white().underline()));
            }
            let started = Instant::now();
            let extractor = Extractor::with_fetch_config(args.fetch_config()).readability_config(args.readability_config());
            let article = extractor.process(&ExtractionRequest::new(url)).await;
            if args.verbose {
                echo::print_step(2, 2, "Extracted article");
                echo::print_timing("Fetch and extract", started.elapsed());
            }
            article
        }
        Input::File(path) => {
            if args.verbose {
                echo::print_step(1, 2, &format!("Reading file {}", path.bright_white()));
            }
            let html = fetch_file(&path).map_err(|e| ExtractionError::from_error(e, path.as_str()))?;
            extract_local(args, &html, &path)
        }
        Input::Stdin => {
            if args.verbose {
                echo::print_step(1, 2, "Reading from stdin");
            }
            let html = fetch_stdin().map_err(|e| ExtractionError::from_error(e, STDIN))?;
            extract_local(args, &html, STDIN)
        }
    }
}

/// Extracts HTML read from disk or stdin, attributing it to `--url` when given.
fn extract_local(args: &Args, html: &str, source: &str) -> Result<ExtractedArticle, ExtractionError> {
    if args.verbose {
        echo::print_field("Size", &echo::format_size(html.len()));
        echo::print_step(2, 2, "Extracting article");
    }

    let requested = args.url.as_deref().unwrap_or(source);
    let page_url = match &args.url {
        Some(url) => parse_article_url(url),
        None => local_page_url(source),
    }
    .map_err(|e| ExtractionError::from_error(e, requested))?;

    let started = Instant::now();
    let readability = Readability::with_config(args.readability_config());
    let article =
        extract_article(&readability, html, &page_url, requested).map_err(|e| ExtractionError::from_error(e, requested));

    if args.verbose {
        echo::print_timing("Extract", started.elapsed());
    }
    article
}

/// `file://` address for local input; stdin is treated as a file in the
/// working directory.
fn local_page_url(source: &str) -> jaib_core::Result<Url> {
    let path = if source == STDIN { std::env::current_dir()?.join("stdin.html") } else { fs::canonicalize(source)? };
    Url::from_file_path(&path).map_err(|()| JaibError::Internal(format!("{} is not an absolute path", path.display())))
}

fn render(article: &ExtractedArticle, args: &Args) -> jaib_core::Result<String> {
    match args.format.0 {
        OutputFormat::Json => article.to_json(),
        OutputFormat::Html => Ok(article.content.clone()),
        OutputFormat::Text => Ok(article.to_text(&TextConfig::default())),
        OutputFormat::Markdown => {
            let config = MarkdownConfig {
                include_frontmatter: args.frontmatter,
                include_references: args.references,
                strip_images: args.no_images,
                ..MarkdownConfig::default()
            };
            Ok(article.to_markdown(&config))
        }
    }
}
