//! Simple inspector for share tokens.
//!
//! Usage: `cargo run --example inspect_token -- <token | share URL>`

use sharelink::{decode_detailed, validate_token, CodecOptions, MarkdownDocument};

fn preview(text: &str) -> String {
    let preview: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        format!("{:?}...", preview)
    } else {
        format!("{:?}", preview)
    }
}

/// Pulls the token out of a pasted share URL (`...#/edit/<token>` or `...?d=<token>`).
fn extract_token(input: &str) -> &str {
    if let Some((_, query)) = input.split_once("?d=") {
        return query.split('&').next().unwrap_or(query);
    }
    input.rsplit('/').next().unwrap_or(input)
}

fn main() {
    let Some(input) = std::env::args().nth(1) else {
        eprintln!("usage: inspect_token <token | share URL>");
        std::process::exit(2);
    };
    let token = extract_token(&input);

    println!("Token length: {} chars", token.len());

    match validate_token(token) {
        Ok(shape) => {
            println!("Tagged: {}", shape.tagged);
            println!("Payload length: {}", shape.payload_len);
            println!("Likely scheme: {}", shape.likely_scheme().name());
        }
        Err(err) => {
            println!("Malformed token: {} ({})", err, err.code().as_str());
            std::process::exit(1);
        }
    }

    let decoded = match decode_detailed(token, &CodecOptions::default()) {
        Ok(decoded) => decoded,
        Err(err) => {
            println!("Undecodable: {}", err);
            std::process::exit(1);
        }
    };

    println!("\n=== Decoded ===");
    println!("Scheme: {}", decoded.scheme.name());
    println!("Text length: {} chars", decoded.text.chars().count());
    println!(
        "Ratio: {:.2}",
        token.len() as f64 / decoded.text.len().max(1) as f64
    );
    println!("Preview: {}", preview(&decoded.text));

    if decoded.text.trim_start().starts_with('{') {
        let doc = MarkdownDocument::from_text(&decoded.text);
        println!("\n=== Markdown Document ===");
        println!("Title: {}", doc.title);
        println!("Content: {}", preview(&doc.content));
    }
}
