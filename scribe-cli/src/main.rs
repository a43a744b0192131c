//! scribe-cli: command-line client for the Scribe classification API
//!
//! Submits transcripts to a running `scribe-server` and fetches stored results.
//!
//! # Subcommands
//! - `analyze --transcript-id <id> --creator-id <id> (--text <t> | --file <path>) [--json]`
//! - `get <analysis_id> [--json]`
//! - `status`

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "scribe-cli",
    version,
    about = "Scribe entity classification: submit transcripts and fetch results"
)]
struct Cli {
    /// Scribe HTTP server URL (overrides SCRIBE_HTTP_URL env var)
    #[arg(long, env = "SCRIBE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a transcript and store the result
    Analyze {
        /// Caller-side reference to the transcript
        #[arg(long)]
        transcript_id: String,

        /// Owner of the analysis
        #[arg(long)]
        creator_id: String,

        #[command(flatten)]
        source: TranscriptSource,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Fetch a stored classification by analysis id
    Get {
        analysis_id: String,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },

    /// Check that the server is up
    Status,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct TranscriptSource {
    /// Transcript text given inline
    #[arg(long)]
    text: Option<String>,

    /// Read the transcript text from a file (`-` for stdin)
    #[arg(long)]
    file: Option<PathBuf>,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AnalyzePayload<'a> {
    pub transcript_id: &'a str,
    pub transcript_text: &'a str,
    pub creator_id: &'a str,
}

/// Response body of POST /api/entity-classification/analyze
#[derive(Debug, Deserialize, Serialize)]
pub struct AnalyzeResult {
    pub status: String,
    pub analysis_id: String,
    pub entities: serde_json::Value,
    pub tone: serde_json::Value,
    pub style: serde_json::Value,
    pub safety_flags: serde_json::Value,
}

/// Response body of GET /api/entity-classification/results/{id}
#[derive(Debug, Deserialize, Serialize)]
pub struct StoredResult {
    pub analysis_id: String,
    pub transcript_id: String,
    pub creator_id: String,
    pub entities: serde_json::Value,
    pub tone: serde_json::Value,
    pub style: serde_json::Value,
    pub safety_flags: serde_json::Value,
    pub created_at: String,
}

// ============================================================================
// Output Formatting
// ============================================================================

/// Render a payload value on one line: arrays are comma-joined, empty arrays
/// and nulls become "-".
pub fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) if items.is_empty() => "-".to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Render an opaque payload as indented `key: value` lines.
pub fn render_payload(title: &str, payload: &serde_json::Value) -> String {
    let mut out = format!("{}:\n", title);
    match payload.as_object() {
        Some(map) if !map.is_empty() => {
            let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
            for (key, value) in map {
                out.push_str(&format!(
                    "  {:width$}  {}\n",
                    key,
                    render_value(value),
                    width = width
                ));
            }
        }
        Some(_) => out.push_str("  -\n"),
        None => out.push_str(&format!("  {}\n", render_value(payload))),
    }
    out
}

fn render_payloads(
    entities: &serde_json::Value,
    tone: &serde_json::Value,
    style: &serde_json::Value,
    safety_flags: &serde_json::Value,
) -> String {
    [
        render_payload("Entities", entities),
        render_payload("Tone", tone),
        render_payload("Style", style),
        render_payload("Safety flags", safety_flags),
    ]
    .join("\n")
}

pub fn render_analyze(result: &AnalyzeResult) -> String {
    format!(
        "Analysis:   {}\n\n{}",
        result.analysis_id,
        render_payloads(&result.entities, &result.tone, &result.style, &result.safety_flags)
    )
}

pub fn render_stored(result: &StoredResult) -> String {
    format!(
        "Analysis:   {}\nTranscript: {}\nCreator:    {}\nCreated:    {}\n\n{}",
        result.analysis_id,
        result.transcript_id,
        result.creator_id,
        result.created_at,
        render_payloads(&result.entities, &result.tone, &result.style, &result.safety_flags)
    )
}

fn read_transcript(source: &TranscriptSource) -> anyhow::Result<String> {
    match (&source.text, &source.file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            std::io::read_to_string(std::io::stdin()).context("failed to read transcript from stdin")
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript from {}", path.display())),
        (None, None) => anyhow::bail!("either --text or --file is required"),
    }
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

/// Exit with the server's plain-text message on a non-2xx response.
fn ensure_success(resp: reqwest::blocking::Response) -> reqwest::blocking::Response {
    if resp.status().is_success() {
        return resp;
    }
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    eprintln!("scribe-cli: server returned {}: {}", status, body.trim());
    std::process::exit(1);
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn do_analyze(
    server: &str,
    transcript_id: &str,
    creator_id: &str,
    source: &TranscriptSource,
    json_output: bool,
) -> anyhow::Result<()> {
    let text = read_transcript(source)?;
    let url = format!("{}/api/entity-classification/analyze", server);
    let payload = AnalyzePayload {
        transcript_id,
        transcript_text: &text,
        creator_id,
    };

    let resp = match client()?.post(&url).json(&payload).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("scribe-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let result: AnalyzeResult = ensure_success(resp)
        .json()
        .context("failed to parse analyze response")?;

    if json_output {
        print_json(&result)
    } else {
        print!("{}", render_analyze(&result));
        Ok(())
    }
}

/// URL of a stored result. The id is pushed as a single path segment, so
/// `/`, `?` and `#` are percent-encoded rather than changing the route.
pub fn result_url(server: &str, analysis_id: &str) -> anyhow::Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(server)
        .with_context(|| format!("invalid server URL {:?}", server))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("server URL {:?} cannot carry a path", server))?
        .pop_if_empty()
        .extend(["api", "entity-classification", "results"])
        .push(analysis_id);
    Ok(url)
}

fn do_get(server: &str, analysis_id: &str, json_output: bool) -> anyhow::Result<()> {
    let url = result_url(server, analysis_id)?;

    let resp = match client()?.get(url.clone()).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("scribe-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let result: StoredResult = ensure_success(resp)
        .json()
        .context("failed to parse result response")?;

    if json_output {
        print_json(&result)
    } else {
        print!("{}", render_stored(&result));
        Ok(())
    }
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    match client()?.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body = r.text().unwrap_or_default();
            println!("Scribe server: {}", body.trim());
            println!("URL:           {}", server);
        }
        Ok(r) => {
            eprintln!("scribe-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("scribe-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match &cli.command {
        Commands::Analyze {
            transcript_id,
            creator_id,
            source,
            json,
        } => do_analyze(&server, transcript_id, creator_id, source, *json),
        Commands::Get { analysis_id, json } => do_get(&server, analysis_id, *json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("scribe-cli: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
