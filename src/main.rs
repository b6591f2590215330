//! # ScribbleCraft CLI
//!
//! Usage:
//!   scribblecraft request.json -o out/
//!   echo '{ ... }' | scribblecraft - --format pdf
//!   scribblecraft --example > notes.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use scribblecraft::font::FontContext;
use scribblecraft::layout::LayoutEngine;
use scribblecraft::{compose, ExportRequest, ScribeError};

#[derive(Parser)]
#[command(name = "scribblecraft")]
#[command(version)]
#[command(about = "Render rich text as hand-lettered pages (PNG or PDF)", long_about = None)]
struct Cli {
    /// Export request JSON, or "-" for stdin
    #[arg(value_name = "REQUEST")]
    input: Option<String>,

    /// Output directory
    #[arg(short = 'o', long = "out-dir", value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// What to export
    #[arg(long, value_enum, default_value = "png")]
    format: Format,

    /// Page width in CSS pixels (overrides the request)
    #[arg(long, value_name = "PX")]
    width: Option<f64>,

    /// Device pixel ratio (overrides the request)
    #[arg(long, value_name = "N")]
    dpr: Option<f64>,

    /// Print the placed words of every page as JSON instead of exporting
    #[arg(long)]
    dump_layout: bool,

    /// Print an example request and exit
    #[arg(long)]
    example: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One stitched PNG
    Png,
    /// One PDF page per page
    Pdf,
    /// Both files
    Both,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_request_json());
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ScribeError> {
    let input = match cli.input.as_deref() {
        Some(path) if path != "-" => fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut request = ExportRequest::from_json(&input)?;
    if let Some(width) = cli.width {
        request.config.page_width = width;
    }
    if let Some(dpr) = cli.dpr {
        request.config.device_pixel_ratio = dpr;
    }

    if cli.dump_layout {
        return dump_layout(&request);
    }

    let pages = scribblecraft::render_request(&request);
    if pages.is_empty() {
        eprintln!("nothing to export");
        return Ok(());
    }

    let mut artifacts = Vec::new();
    if matches!(cli.format, Format::Png | Format::Both) {
        artifacts.extend(compose::stitched_artifact(&pages)?);
    }
    if matches!(cli.format, Format::Pdf | Format::Both) {
        artifacts.extend(compose::paged_artifact(&pages)?);
    }

    for artifact in artifacts {
        let path = artifact.save_to(&cli.out_dir)?;
        eprintln!("✓ Written {} bytes to {}", artifact.bytes.len(), path.display());
    }
    Ok(())
}

fn dump_layout(request: &ExportRequest) -> Result<(), ScribeError> {
    let fonts = FontContext::for_request(&request.fonts, request.config.system_fonts);
    let engine = LayoutEngine::from_config(&request.config, request.config.page_width);
    let pages: Vec<_> = request
        .documents()
        .iter()
        .map(|doc| engine.layout_lines(doc, &fonts))
        .collect();
    let json = serde_json::to_string_pretty(&pages).map_err(|e| ScribeError::Encode(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn example_request_json() -> &'static str {
    r##"{
  "pages": [
    "<h1>Weekend plans</h1><p>Pick up <b>fresh bread</b> and <i>something sweet</i> on the way home.</p><ul><li>Water the plants</li><li>Call grandma</li><li>Finish the <u>crossword</u></li></ul>",
    "<h2>Reading list</h2><ol><li>The Hobbit</li><li>Piranesi</li><li>A Psalm for the Wild-Built</li></ol><div>Remember to return the library books!</div>"
  ],
  "fontFamily": "'Shadows Into Light', cursive",
  "fontSizePx": 42,
  "inkColorHex": "#1a1a1a",
  "backgroundVariant": "notebook-paper",
  "displayMode": "light"
}
"##
}
