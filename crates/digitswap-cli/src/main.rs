// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DigitSwap — command-line front end.
//
// Entry point. Initialises logging, loads the page image and the detector's
// token JSON, runs one replacement pass and writes the altered page.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use digitswap_core::error::{DigitSwapError, Result};
use digitswap_core::human_errors::humanize_error;
use digitswap_core::{EngineOptions, FontStyle, ReplacementPolicy};
use digitswap_engine::{DetectorPayload, Engine, GlyphSource, RasterSurface, ReplacementReport};
use image::DynamicImage;

#[derive(Parser, Debug)]
#[command(
    name = "digitswap",
    version,
    about = "Replace printed digits on a photographed worksheet"
)]
struct Cli {
    /// Page image (PNG, JPEG, ...)
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Detector output: token array or {"coordinates", "tokens"} object
    #[arg(short = 't', long = "tokens")]
    tokens: PathBuf,

    /// Where to write the altered page
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Engine options JSON; missing fields keep their defaults
    #[arg(long = "options")]
    options: Option<PathBuf>,

    /// Seed for reproducible replacement values
    #[arg(long = "seed")]
    seed: Option<u64>,

    #[arg(long = "policy", value_enum)]
    policy: Option<PolicyArg>,

    /// Also replace superscripts and subscripts
    #[arg(long = "replace-scripts")]
    replace_scripts: bool,

    /// Font file for a style, e.g. serif=/path/Serif.ttf (repeatable)
    #[arg(long = "font", value_parser = parse_font_override)]
    fonts: Vec<(FontStyle, PathBuf)>,

    /// Device pixels per logical pixel of the detector coordinates
    #[arg(long = "dpr", default_value_t = 1.0)]
    dpr: f32,

    /// Print the full report as JSON
    #[arg(long = "json")]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    DigitWise,
    Unique,
}

impl From<PolicyArg> for ReplacementPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::DigitWise => ReplacementPolicy::DigitWise,
            PolicyArg::Unique => ReplacementPolicy::Unique,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(image = %cli.image.display(), "DigitSwap starting");

    let result = build_options(&cli)
        .and_then(Engine::with_system_fonts)
        .and_then(|engine| process(&engine, &cli));

    match result {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => return fail(&DigitSwapError::from(e)),
                }
            } else {
                print!("{}", summary(&report));
            }
            ExitCode::SUCCESS
        }
        Err(err) => fail(&err),
    }
}

fn fail(err: &DigitSwapError) -> ExitCode {
    tracing::error!(error = %err, "DigitSwap failed");
    let human = humanize_error(err);
    eprintln!("{}\n{}", human.message, human.suggestion);
    ExitCode::FAILURE
}

// -- Steps ------------------------------------------------------------------

/// Options file (or defaults) with command-line overrides applied.
fn build_options(cli: &Cli) -> Result<EngineOptions> {
    let mut options = match &cli.options {
        Some(path) => EngineOptions::from_json_file(path)?,
        None => EngineOptions::default(),
    };
    if let Some(seed) = cli.seed {
        options.seed = Some(seed);
    }
    if let Some(policy) = cli.policy {
        options.policy = policy.into();
    }
    if cli.replace_scripts {
        options.replace_scripts = true;
    }
    for (style, path) in &cli.fonts {
        options.font_files.insert(*style, path.clone());
    }
    Ok(options)
}

/// Load, replace, save. Fails with `NoEligibleTokens` when nothing changed,
/// in which case no output is written.
fn process<G: GlyphSource>(engine: &Engine<G>, cli: &Cli) -> Result<ReplacementReport> {
    let mut surface = load_surface(&cli.image, cli.dpr)?;
    let payload = DetectorPayload::from_json_str(&fs::read_to_string(&cli.tokens)?)?;
    let report = engine
        .replace_from_payload(&mut surface, &payload)?
        .require_any()?;
    save_surface(surface, &cli.output)?;
    tracing::info!(output = %cli.output.display(), replaced = report.replaced_count(), "Page written");
    Ok(report)
}

fn load_surface(path: &Path, dpr: f32) -> Result<RasterSurface> {
    let img = image::open(path)
        .map_err(|e| DigitSwapError::ImageError(format!("{}: {e}", path.display())))?;
    RasterSurface::new(img.to_rgba8(), dpr)
}

fn save_surface(surface: RasterSurface, path: &Path) -> Result<()> {
    let out = DynamicImage::ImageRgba8(surface.into_image());
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    // JPEG has no alpha channel.
    let out = if is_jpeg {
        DynamicImage::ImageRgb8(out.to_rgb8())
    } else {
        out
    };
    out.save(path)
        .map_err(|e| DigitSwapError::ImageError(format!("{}: {e}", path.display())))
}

fn summary(report: &ReplacementReport) -> String {
    let mut out = String::new();
    for (original, replacement) in &report.replacements {
        out.push_str(&format!("{original} -> {replacement}\n"));
    }
    out.push_str(&format!(
        "{} replaced, {} skipped, {} failed, {} dropped\n",
        report.replaced_count(),
        report.skipped.len(),
        report.failures.len(),
        report.dropped.len()
    ));
    out
}

fn parse_font_override(arg: &str) -> std::result::Result<(FontStyle, PathBuf), String> {
    let (label, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected STYLE=PATH, got '{arg}'"))?;
    let style = FontStyle::from_label(label).ok_or_else(|| format!("unknown font style '{label}'"))?;
    if path.is_empty() {
        return Err(format!("missing font path for '{label}'"));
    }
    Ok((style, PathBuf::from(path)))
}
