//! Benchmark for share token encoding.
//!
//! Compares the compact and DEFLATE schemes on built-in sample documents and
//! on any files passed on the command line.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use sharelink::codec::{compact, deflate};
use sharelink::document::{DEFAULT_DIAGRAM, DEFAULT_MARKDOWN};
use sharelink::limits::RECOMMENDED_URL_LEN;
use sharelink::{decode_detailed, encode_with_options, CodecOptions, DeflateFormat, MarkdownDocument};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Zlib,
    Raw,
    Gzip,
}

impl From<Format> for DeflateFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Zlib => DeflateFormat::Zlib,
            Format::Raw => DeflateFormat::Raw,
            Format::Gzip => DeflateFormat::Gzip,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bench-share-tokens", about = "Compare share token schemes")]
struct Args {
    /// Extra documents to measure.
    files: Vec<PathBuf>,

    /// DEFLATE compression level (0-9).
    #[arg(long, default_value_t = 9)]
    level: u32,

    /// DEFLATE container.
    #[arg(long, value_enum, default_value_t = Format::Zlib)]
    format: Format,

    /// Timed iterations per operation.
    #[arg(long, default_value_t = 20)]
    iters: u32,

    /// Emit one JSON record per document instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    name: String,
    input_chars: usize,
    compact_len: usize,
    deflate_len: usize,
    chosen_len: usize,
    chosen_scheme: &'static str,
    ratio: f64,
    encode_us: f64,
    decode_us: f64,
    roundtrip_ok: bool,
}

// =============================================================================
// SAMPLE DOCUMENTS
// =============================================================================

fn samples() -> Vec<(String, String)> {
    let markdown = MarkdownDocument::new("New Document", DEFAULT_MARKDOWN)
        .to_json()
        .expect("Failed to serialize markdown sample");

    let flowchart: String = (0..200)
        .map(|i| format!("    N{} --> N{}[Step {}]\n", i, i + 1, i + 1))
        .collect();

    vec![
        ("small-diagram".to_string(), "graph TD; A-->B;".to_string()),
        ("default-diagram".to_string(), DEFAULT_DIAGRAM.to_string()),
        ("default-markdown".to_string(), markdown),
        (
            "repeated-lines".to_string(),
            vec!["This is a line of mermaid diagram text to make it larger."; 500].join("\n"),
        ),
        ("flowchart-200".to_string(), format!("graph TD\n{}", flowchart)),
        (
            "unicode".to_string(),
            "# 多言語メモ\n\nПривет, мир! \u{1F680} café naïve\n".repeat(40),
        ),
    ]
}

// =============================================================================
// MEASUREMENT
// =============================================================================

fn average<F: FnMut()>(iters: u32, mut f: F) -> Duration {
    // Warmup
    for _ in 0..3 {
        f();
    }
    let start = Instant::now();
    for _ in 0..iters {
        f();
    }
    start.elapsed() / iters.max(1)
}

fn measure(name: &str, text: &str, options: &CodecOptions, iters: u32) -> Report {
    let compact_token = compact::compress(text);
    let deflate_token = deflate::compress(text, options).expect("Failed to deflate");
    let encoded = encode_with_options(text, options);

    let encode_time = average(iters, || {
        let _ = encode_with_options(text, options);
    });
    let decode_time = average(iters, || {
        let _ = decode_detailed(&encoded.token, options);
    });

    let roundtrip_ok = decode_detailed(&encoded.token, options)
        .map(|decoded| decoded.text == text)
        .unwrap_or(false);

    Report {
        name: name.to_string(),
        input_chars: text.chars().count(),
        compact_len: compact_token.len(),
        deflate_len: deflate_token.len(),
        chosen_len: encoded.token.len(),
        chosen_scheme: encoded.scheme.name(),
        ratio: encoded.token.len() as f64 / text.len().max(1) as f64,
        encode_us: encode_time.as_secs_f64() * 1e6,
        decode_us: decode_time.as_secs_f64() * 1e6,
        roundtrip_ok,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = CodecOptions::new()
        .with_level(args.level)
        .with_format(args.format.into());

    let mut documents = samples();
    for path in &args.files {
        match fs::read_to_string(path) {
            Ok(text) => documents.push((path.display().to_string(), text)),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable file"),
        }
    }
    info!(documents = documents.len(), level = options.level, format = ?options.format, "measuring");

    let reports: Vec<Report> = documents
        .iter()
        .map(|(name, text)| measure(name, text, &options, args.iters))
        .collect();

    if args.json {
        for report in &reports {
            println!("{}", serde_json::to_string(report).expect("Failed to serialize report"));
        }
    } else {
        println!(
            "{:<20} {:>8} {:>8} {:>8} {:>8} {:>7} {:>10} {:>10}",
            "document", "chars", "compact", "deflate", "chosen", "ratio", "enc (us)", "dec (us)"
        );
        for r in &reports {
            println!(
                "{:<20} {:>8} {:>8} {:>8} {:>8} {:>7.3} {:>10.1} {:>10.1}",
                r.name, r.input_chars, r.compact_len, r.deflate_len, r.chosen_len, r.ratio, r.encode_us, r.decode_us
            );
        }
    }

    // Summary
    let compact_wins = reports.iter().filter(|r| r.chosen_scheme == "compact").count();
    eprintln!("\n=== Summary ===");
    eprintln!("Documents: {}", reports.len());
    eprintln!("Compact chosen: {}", compact_wins);
    eprintln!("Deflate chosen: {}", reports.len() - compact_wins);

    for r in reports.iter().filter(|r| r.chosen_len > RECOMMENDED_URL_LEN) {
        warn!(document = %r.name, token_len = r.chosen_len, "token exceeds recommended URL length");
    }

    let failures: Vec<&str> = reports
        .iter()
        .filter(|r| !r.roundtrip_ok)
        .map(|r| r.name.as_str())
        .collect();
    assert!(failures.is_empty(), "Round-trip failed for: {:?}", failures);
}
