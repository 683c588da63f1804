use anyhow::Context;
use secret_search::{Config, test_cases::TestCase};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILES: [&str; 2] = ["testcase1.json", "testcase2.json"];

// This binary solves test case files offline, one after the other. A test case that
// cannot be solved is reported and the remaining ones are still processed.
// Run via
// ```
// cargo run --bin solve_files -- files=<file1,file2,...>
// ```
// Without `files`, `testcase1.json` and `testcase2.json` of the working directory are used.
fn main() {
    let config = Config::parse_environment().unwrap_or_else(|e| {
        eprintln!("Invalid configuration, using defaults: {e}");
        Config::default()
    });
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(LevelFilter::from_level(config.log_level)),
        )
        .init();

    let files = std::env::args()
        .find(|arg| arg.starts_with("files="))
        .map(|arg| {
            arg.trim_start_matches("files=")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<String>>()
        })
        .unwrap_or_else(|| DEFAULT_FILES.iter().map(|f| f.to_string()).collect());
    if files.is_empty() {
        eprintln!("files argument cannot be empty");
        std::process::exit(1);
    }

    let mut failures = 0;
    for (i, file) in files.iter().enumerate() {
        println!("\n----- Testcase {} ({}) -----", i + 1, file);
        match solve_file(file) {
            Ok(secret) => println!("Secret for Testcase {}: {}", i + 1, secret),
            Err(e) => {
                failures += 1;
                eprintln!("No secret could be determined for Testcase {}: {:#}", i + 1, e);
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

fn solve_file(file: &str) -> Result<String, anyhow::Error> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    let test_case = TestCase::from_json(&raw).with_context(|| format!("parsing {file}"))?;

    for (point, base) in test_case.parsed_points() {
        println!("Parsed: x = {}, y = {} (base {})", point.x(), point.y(), base);
    }

    let secret = test_case.solve().context("searching the secret")?;
    Ok(secret.to_string())
}
