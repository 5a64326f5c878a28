//! Font loading utilities for the notion2pdf crate.
//!
//! Two bundled families are required: a proportional family for body text and
//! headings, and a monospace family for code spans. Directories are searched
//! in order (the `NOTION2PDF_FONTS_DIR` environment variable, `assets/fonts`
//! next to the running binary, then `assets/fonts` under the crate manifest)
//! and the first directory containing every required file wins.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};

/// Name of the bundled proportional font family.
pub const TEXT_FONT_FAMILY_NAME: &str = "Roboto";

/// Name of the bundled monospace font family used for code spans.
pub const MONO_FONT_FAMILY_NAME: &str = "RobotoMono";

const TEXT_FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

const MONO_FONT_FILES: &[&str] = &[
    "RobotoMono-Regular.ttf",
    "RobotoMono-Bold.ttf",
    "RobotoMono-Italic.ttf",
    "RobotoMono-BoldItalic.ttf",
];

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = env::var("NOTION2PDF_FONTS_DIR") {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.iter().any(|existing| existing == &candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if !candidates
        .iter()
        .any(|existing| existing == &manifest_candidate)
    {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path, files: &[&str]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory(files: &[&str]) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate, files);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            format!("directory missing at {}", candidate.display())
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };

        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(Error::new(
        format!(
            "Unable to locate bundled font directory. Checked: {}. See assets/fonts/README.md or set NOTION2PDF_FONTS_DIR.",
            attempts.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_family(name: &str, files: &[&str]) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory(files)?;

    fonts::from_files(&directory, name, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                name,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Returns the bundled proportional font family used for all regular text.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    load_family(TEXT_FONT_FAMILY_NAME, TEXT_FONT_FILES)
}

/// Returns the bundled monospace font family used for code spans.
pub fn monospace_font_family() -> Result<FontFamily<FontData>, Error> {
    load_family(MONO_FONT_FAMILY_NAME, MONO_FONT_FILES)
}

/// Indicates whether every bundled font required for rendering is on disk.
///
/// Rendering tests consult this to skip gracefully on hosts without the font
/// assets.
pub fn fonts_available() -> bool {
    resolve_font_directory(TEXT_FONT_FILES).is_ok()
        && resolve_font_directory(MONO_FONT_FILES).is_ok()
}
