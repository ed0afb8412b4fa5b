use std::{env, fs, io, path::PathBuf};

use clap_complete::shells::{Bash, Fish, PowerShell, Zsh};

fn command() -> clap::Command {
    clap::Command::new("jaib")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract the readable article, byline and lead image from a web page")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, '-' for stdin, or shared text containing a URL"))
        .arg(clap::arg!(--url <URL> "Address of the page when reading from a file or stdin"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, html, text, markdown)")
                .default_value("markdown")
                .value_parser(["json", "html", "text", "markdown"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"timeout-ms" <MS> "Fetch timeout in milliseconds").default_value("20000"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--"min-score" <SCORE> "Minimum candidate score for a page to count as an article").default_value("20"))
        .arg(clap::arg!(--"no-images" "Strip images from output"))
        .arg(clap::arg!(--frontmatter "Include TOML frontmatter (Markdown only)"))
        .arg(clap::arg!(--references "Append a reference table with all links (Markdown only)"))
        .arg(clap::arg!(-v --verbose "Print progress and article details to stderr"))
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| io::Error::other("OUT_DIR is not set"))?);
    let completions_dir = out_dir.join("completions");
    fs::create_dir_all(&completions_dir)?;

    let mut cmd = command();
    clap_complete::generate_to(Bash, &mut cmd, "jaib", &completions_dir)?;
    clap_complete::generate_to(Zsh, &mut cmd, "jaib", &completions_dir)?;
    clap_complete::generate_to(Fish, &mut cmd, "jaib", &completions_dir)?;
    clap_complete::generate_to(PowerShell, &mut cmd, "jaib", &completions_dir)?;

    Ok(())
}
