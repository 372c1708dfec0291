use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

const APP_DIR_NAME: &str = "social-score-verifier";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];
#[cfg(not(windows))]
const COMMON_EXECUTABLES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its compiled-in tessdata location.
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for locally provisioned Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("tesseract")
}

/// Finds the Tesseract executable and trained data.
///
/// Explicit overrides win; otherwise the local data dir, then `PATH`, then
/// common install locations are checked.
pub fn locate_tesseract(
    executable_override: Option<&Path>,
    tessdata_override: Option<&Path>,
    language: &str,
) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(executable_override)?;
    let tessdata = find_tessdata_dir(tessdata_override, language);

    tracing::info!(
        executable = %executable.display(),
        tessdata = ?tessdata,
        "Tesseract located"
    );

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable, checking the override and local dir first, then system
pub fn find_tesseract_executable(executable_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = executable_override {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured Tesseract executable does not exist: {}",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    // Check common paths
    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR, add it to PATH, or set \"tesseract_path\" in config.json."
    ))
}

/// Finds a tessdata directory holding `<language>.traineddata`.
pub fn find_tessdata_dir(tessdata_override: Option<&Path>, language: &str) -> Option<PathBuf> {
    let traineddata = format!("{}.traineddata", language);

    if let Some(dir) = tessdata_override {
        if dir.join(&traineddata).exists() {
            return Some(dir.to_path_buf());
        }
        tracing::warn!(
            dir = %dir.display(),
            "Configured tessdata dir has no {}, ignoring",
            traineddata
        );
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(&traineddata).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(&traineddata).exists() {
            return Some(p);
        }
    }

    let local_tessdata = get_tesseract_dir().join("tessdata");
    if local_tessdata.join(&traineddata).exists() {
        return Some(local_tessdata);
    }

    None
}
