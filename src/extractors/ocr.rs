//! Rasterize-and-recognize strategy using `pdftoppm` and `tesseract`.
//!
//! Both tools are invoked as subprocesses. Pages are rendered to PNG in a
//! scratch directory that is removed when the call returns.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{join_pages, StrategyError, StrategyResult, TextStrategy};

/// OCR fallback for image-only documents.
#[derive(Debug, Clone)]
pub struct OcrStrategy {
    languages: String,
    dpi: u32,
}

impl OcrStrategy {
    /// Create an OCR strategy for the given tesseract languages (`por+eng`) and resolution.
    pub fn new(languages: impl Into<String>, dpi: u32) -> Self {
        Self {
            languages: languages.into(),
            dpi,
        }
    }

    fn render_pages(&self, pdf: &Path, scratch: &Path) -> Result<Vec<PathBuf>, StrategyError> {
        let prefix = scratch.join("page");
        let output = run_tool(
            Command::new("pdftoppm")
                .arg("-png")
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg(pdf)
                .arg(&prefix),
            "pdftoppm",
        )?;
        if !output.status.success() {
            return Err(StrategyError::Extraction(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut images: Vec<PathBuf> = std::fs::read_dir(scratch)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        // pdftoppm zero-pads page numbers to a fixed width, so names sort in page order
        images.sort();
        Ok(images)
    }

    fn recognize(&self, image: &Path) -> Result<String, StrategyError> {
        let output = run_tool(
            Command::new("tesseract")
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.languages),
            "tesseract",
        )?;
        if !output.status.success() {
            return Err(StrategyError::Extraction(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextStrategy for OcrStrategy {
    fn text_for(&self, path: &Path) -> StrategyResult {
        let scratch = tempfile::tempdir()?;
        let images = self.render_pages(path, scratch.path())?;
        if images.is_empty() {
            return Err(StrategyError::Extraction("pdftoppm produced no images".into()));
        }

        log::debug!(
            "OCR {} ({} pages, dpi={}, lang={})",
            path.display(),
            images.len(),
            self.dpi,
            self.languages
        );
        let pages: Vec<_> = images.iter().map(|image| self.recognize(image)).collect();
        join_pages(self.name(), path, pages)
    }

    fn name(&self) -> &'static str {
        "ocr"
    }
}

fn run_tool(command: &mut Command, tool: &str) -> Result<Output, StrategyError> {
    command.output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StrategyError::Unavailable(format!("{} is not installed", tool))
        } else {
            StrategyError::Io(e)
        }
    })
}
