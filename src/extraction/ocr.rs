//! Optical character recognition over rasterized PDF pages.
//!
//! The default engine shells out to poppler's `pdftoppm` to render each page to PNG inside a
//! scratch directory, then runs `tesseract <image> stdout` on every page in page order.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::Config;

use super::ExtractionError;

/// Renders PDF pages to images and recognizes their text.
pub trait OcrEngine: Send + Sync {
    /// Return the recognized text of every page of `pdf`, in page order.
    fn recognize_pdf_pages(&self, pdf: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// OCR engine backed by the `pdftoppm` and `tesseract` command-line tools.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pdftoppm_cmd: String,
    tesseract_cmd: String,
    dpi: u32,
}

impl TesseractOcr {
    /// Build an engine from explicit executable names and rasterization DPI.
    pub fn new(
        pdftoppm_cmd: impl Into<String>,
        tesseract_cmd: impl Into<String>,
        dpi: u32,
    ) -> Self {
        Self {
            pdftoppm_cmd: pdftoppm_cmd.into(),
            tesseract_cmd: tesseract_cmd.into(),
            dpi,
        }
    }

    /// Build an engine from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.pdftoppm_cmd, &config.tesseract_cmd, config.ocr_dpi)
    }

    fn rasterize(&self, pdf: &[u8], workdir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let input = workdir.join("input.pdf");
        std::fs::write(&input, pdf)?;

        let output = Command::new(&self.pdftoppm_cmd)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(&input)
            .arg(workdir.join("page"))
            .output()?;
        ensure_success(&self.pdftoppm_cmd, &output)?;

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(workdir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter_map(|path| page_number(&path).map(|number| (number, path)))
            .collect();
        pages.sort_by_key(|(number, _)| *number);
        tracing::debug!(pages = pages.len(), dpi = self.dpi, "Rasterized PDF pages");
        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    fn recognize_image(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.tesseract_cmd)
            .arg(image)
            .arg("stdout")
            .output()?;
        ensure_success(&self.tesseract_cmd, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize_pdf_pages(&self, pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let workdir = tempfile::Builder::new()
            .prefix("analyst-ocr-")
            .tempdir()?;
        let images = self.rasterize(pdf, workdir.path())?;
        images
            .iter()
            .map(|image| self.recognize_image(image))
            .collect()
    }
}

fn ensure_success(program: &str, output: &Output) -> Result<(), ExtractionError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(ExtractionError::Ocr(format!(
        "{program} exited with {}: {}",
        output.status,
        stderr.trim()
    )))
}

/// Parse the page index from `pdftoppm` output names such as `page-1.png` or `page-07.png`.
fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}
