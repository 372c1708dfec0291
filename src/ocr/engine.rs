use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

use super::fragment::{BoundingBox, TextFragment};
use super::setup::TesseractPaths;
use super::{ImageInput, RecognizeOptions, Recognizer};

/// Page segmentation for the full-frame pass: sparse text, as dashboards
/// scatter captions and numbers across the frame.
const PSM_SPARSE: &str = "11";

/// Page segmentation for cropped regions: a single uniform block of text.
const PSM_BLOCK: &str = "6";

/// Recognizer backed by the Tesseract command-line tool.
///
/// Every call runs a separate Tesseract process, so concurrent calls share no
/// state beyond the read-only paths.
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    paths: TesseractPaths,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(paths: TesseractPaths, language: impl Into<String>) -> Self {
        Self {
            paths,
            language: language.into(),
        }
    }

    /// Runs Tesseract on `input`, returning stdout.
    fn run(&self, input: &ImageInput, psm: &str, options: &RecognizeOptions, tsv: bool) -> Result<String> {
        let temp_input = write_input(input)?;

        let mut cmd = Command::new(&self.paths.executable);
        cmd.arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(psm)
            // One thread per process; concurrency comes from running several processes.
            .env("OMP_THREAD_LIMIT", "1");
        if let Some(tessdata) = &self.paths.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        if let Some(allowlist) = options.allowlist {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={}", allowlist));
        }
        if tsv {
            cmd.arg("tsv");
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to run {}", self.paths.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, input: &ImageInput, options: &RecognizeOptions) -> Result<Vec<TextFragment>> {
        let tsv = self.run(input, PSM_SPARSE, options, true)?;
        let fragments = parse_tsv_output(&tsv);
        tracing::debug!(fragments = fragments.len(), "Tesseract full pass complete");
        Ok(fragments)
    }

    fn read_text(&self, input: &ImageInput, options: &RecognizeOptions) -> Result<Vec<String>> {
        let text = self.run(input, PSM_BLOCK, options, false)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Writes the image to a temporary file Tesseract can read.
fn write_input(input: &ImageInput) -> Result<NamedTempFile> {
    let mut temp = NamedTempFile::with_suffix(".png")?;
    match input {
        ImageInput::Encoded(bytes) => {
            temp.write_all(bytes)?;
            temp.flush()?;
        }
        ImageInput::Decoded(img) => {
            img.save(temp.path())
                .context("Failed to write crop for Tesseract")?;
        }
    }
    Ok(temp)
}

/// Words being merged into one fragment.
struct Phrase {
    line_key: (i32, i32, i32),
    words: Vec<String>,
    bbox: BoundingBox,
    conf_sum: f32,
    tallest: f32,
}

impl Phrase {
    fn start(line_key: (i32, i32, i32), text: &str, bbox: BoundingBox, conf: f32) -> Self {
        Self {
            line_key,
            words: vec![text.to_string()],
            bbox,
            conf_sum: conf,
            tallest: bbox.height(),
        }
    }

    /// A word continues the phrase if it is on the same line and the horizontal
    /// gap is no wider than the tallest word so far.
    fn accepts(&self, line_key: (i32, i32, i32), bbox: &BoundingBox) -> bool {
        self.line_key == line_key && bbox.left - self.bbox.right <= self.tallest
    }

    fn push(&mut self, text: &str, bbox: BoundingBox, conf: f32) {
        self.words.push(text.to_string());
        self.bbox = self.bbox.union(&bbox);
        self.conf_sum += conf;
        self.tallest = self.tallest.max(bbox.height());
    }

    fn finish(self) -> TextFragment {
        let confidence = self.conf_sum / self.words.len() as f32 / 100.0;
        TextFragment::new(self.bbox, self.words.join(" "), confidence)
    }
}

/// Parses Tesseract TSV output into phrase-level fragments.
///
/// Words (level 5) on the same block/paragraph/line are merged until a gap
/// wider than the tallest word, so "Total Yaps" stays one fragment while a
/// caption and a number far to its right stay apart.
pub fn parse_tsv_output(tsv: &str) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    let mut current: Option<Phrase> = None;

    for line in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let text = fields[11].trim();
        if level != 5 || text.is_empty() {
            continue;
        }

        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if conf < 0.0 {
            continue;
        }

        let line_key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        let coords: Vec<f32> = fields[6..10]
            .iter()
            .map(|f| f.parse().unwrap_or(0.0))
            .collect();
        let bbox = BoundingBox::from_origin_size(coords[0], coords[1], coords[2], coords[3]);

        match current.as_mut() {
            Some(phrase) if phrase.accepts(line_key, &bbox) => phrase.push(text, bbox, conf),
            _ => {
                let next = Phrase::start(line_key, text, bbox, conf);
                if let Some(done) = current.replace(next) {
                    fragments.push(done.finish());
                }
            }
        }
    }

    // Don't forget the last phrase
    if let Some(done) = current {
        fragments.push(done.finish());
    }

    fragments
}
