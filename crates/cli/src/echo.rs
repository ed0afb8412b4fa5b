use std::time::Duration;

use jaib_core::{ExtractedArticle, ExtractionError};
use owo_colors::OwoColorize;

use crate::VERSION;

pub fn print_banner() {
    eprintln!("\n{} {} {}", "Jaib".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Save the readable part of a page\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an extraction failure: a styled summary line, then the error as JSON.
pub fn print_failure(err: &ExtractionError) {
    eprintln!("{} {} {}", "✗".red(), format!("{}:", err.kind).bright_red().bold(), err.message.bright_red());
    match serde_json::to_string_pretty(err) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", err),
    }
}

/// Print a labelled duration, colored by how long it took.
pub fn print_timing(label: &str, duration: Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 500.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

pub fn print_field(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print the article summary shown in verbose mode.
pub fn print_article_details(article: &ExtractedArticle) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Article".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    print_field("Title", &article.title);
    if let Some(byline) = &article.byline {
        print_field("Byline", byline);
    }
    if let Some(site) = &article.site_name {
        print_field("Site", site);
    }
    print_field("Words", &article.word_count().to_string());
    print_field("Reading time", &format!("{} min", article.reading_time_minutes()));
    match &article.lead_image_url {
        Some(image) => print_field("Lead image", image),
        None => print_warning("No lead image found"),
    }
    eprintln!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
    }
}
