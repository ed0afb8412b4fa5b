//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

const PAGE_URL: &str = "https://fieldnotes.example/posts/reliable-software";

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("jaib")
}

fn get_fixture_path(name: &str) -> String {
    format!("../core/tests/fixtures/{}", name)
}

#[test]
fn test_cli_file_input() {
    cmd()
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Observability before features"));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("article.html")).unwrap();
    cmd()
        .args(["-f", "text", "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("How Small Teams Ship Reliable Software"));
}

#[test]
fn test_cli_json_format() {
    let output = cmd()
        .args(["-f", "json", "--url", PAGE_URL, &get_fixture_path("article.html")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let article: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(article["title"], "How Small Teams Ship Reliable Software");
    assert_eq!(article["byline"], "Maya Ortiz, Dev Patel");
    assert_eq!(article["url"], PAGE_URL);
    assert_eq!(article["lead_image_url"], "https://fieldnotes.example/media/covers/reliable-software.jpg");
    assert!(article["textContent"].as_str().unwrap().len() > 500);
}

#[test]
fn test_cli_html_format_resolves_links() {
    cmd()
        .args(["-f", "html", "--url", PAGE_URL, &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://fieldnotes.example/media/diagrams/pipeline.png"))
        .stdout(predicate::str::contains("site-footer").not());
}

#[test]
fn test_cli_no_images() {
    cmd()
        .args(["-f", "html", "--no-images", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("<img").not());
}

#[test]
fn test_cli_frontmatter() {
    cmd()
        .args(["--frontmatter", "--url", PAGE_URL, &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("+++"))
        .stdout(predicate::str::contains("reading_time_minutes"));
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("article.md");

    cmd()
        .args(["-o", output.to_str().unwrap()])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("How Small Teams Ship Reliable Software"));
}

#[test]
fn test_cli_non_article_fails() {
    cmd()
        .arg(get_fixture_path("nav_only.html"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"error\": \"ExtractionFailed\""));
}

#[test]
fn test_cli_min_score_rejects_article() {
    cmd()
        .args(["--min-score", "100000", &get_fixture_path("article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ExtractionFailed"));
}

#[test]
fn test_cli_invalid_file() {
    cmd().arg("nonexistent.html").assert().failure().stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_cli_invalid_page_url() {
    cmd()
        .args(["--url", "not a url", &get_fixture_path("article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidUrl"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Jaib"))
        .stderr(predicate::str::contains("Maya Ortiz"));
}
