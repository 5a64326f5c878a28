use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use notion2pdf::{export_page, ExportRequest, PageSize};

/// Exports a Notion page to a paginated PDF document.
///
/// Fonts must be present under `assets/fonts` relative to the notion2pdf
/// crate or provided via the `NOTION2PDF_FONTS_DIR` environment variable
/// before running an export.
#[derive(Parser)]
#[command(author, version, about = "Export a Notion page to PDF")]
struct Cli {
    /// Notion integration token used for API authentication.
    #[arg(long)]
    token: String,

    /// Identifier of the Notion page to export.
    #[arg(long)]
    page_id: String,

    /// Path of the PDF file to write.
    #[arg(long)]
    output: PathBuf,

    /// Text stamped diagonally across every page.
    #[arg(long)]
    watermark: Option<String>,

    /// Physical page size of the generated document.
    #[arg(long, default_value = "letter", value_parser = parse_page_size)]
    page_size: PageSize,

    /// Accepted for compatibility; page numbers are not rendered yet.
    #[arg(long)]
    page_numbers: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let request = ExportRequest {
        token: cli.token,
        page_id: cli.page_id,
        output: cli.output,
        watermark: cli.watermark,
        page_size: cli.page_size,
        page_numbers: cli.page_numbers,
    };

    match export_page(&request) {
        Ok(path) => println!("SUCCESS: {}", path.display()),
        Err(err) => {
            eprintln!("ERROR: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn parse_page_size(value: &str) -> Result<PageSize, String> {
    value.parse::<PageSize>().map_err(|err| err.to_string())
}

fn print_error_sources(error: &(dyn Error + 'static)) {
    let mut error = error;
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
