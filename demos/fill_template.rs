//! Fill a template PDF with field values
//!
//! Usage: fill_template <template.pdf> <layout.json> <values.json> [output.pdf]
//!
//! Requires the pdfium library on the system library path.

use lopdf_overlay::{ExportedPdf, FieldValues, OverlayRenderer, PdfiumRasterizer, TemplateLayout};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: {} <template.pdf> <layout.json> <values.json> [output.pdf]", args[0]);
        std::process::exit(2);
    }

    let source = std::fs::read(&args[1])?;
    let layout = TemplateLayout::from_json(&std::fs::read_to_string(&args[2])?)?;
    let values = FieldValues::from_json(&std::fs::read_to_string(&args[3])?)?;

    let renderer = OverlayRenderer::new(PdfiumRasterizer::new());
    let bytes = renderer.render(&source, &layout, &values)?;

    let export = ExportedPdf::new(args.get(4).map(String::as_str), bytes);
    let path = export.save(Path::new("."))?;
    println!("PDF saved as '{}'", path.display());

    Ok(())
}
