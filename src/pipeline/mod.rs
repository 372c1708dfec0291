//! Bounded extraction pipeline.
//!
//! Coordinates one request end to end:
//! - Admission through a fixed-size gate (held for the whole request)
//! - Cheap region-of-interest pass when the screenshot decodes
//! - Full-frame pass when the fast path is unavailable or not trustworthy
//! - Classification, score and handle location on the full fragment set
//!
//! Dropping the returned future abandons the request: no further recognition
//! calls are issued, though one already dispatched finishes in the background.

pub mod gate;
pub mod roi;
pub mod worker;

pub use gate::{AdmissionGate, DEFAULT_CONCURRENCY};
pub use roi::{run_fast_path, FastPathResult};
pub use worker::RecognitionWorker;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::extract::{analyze_fragments, classify, ExtractionOutcome, Source, SourceHint};
use crate::ocr::{ImageInput, RecognizeOptions, Recognizer};
use crate::verify::VerificationResult;

/// Default longest side (px) of the image the fast-path crops are taken from.
pub const DEFAULT_FAST_PATH_MAX_SIDE: u32 = 1600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Maximum requests in flight.
    pub concurrency: usize,
    /// Try the region-of-interest pass before the full frame.
    pub fast_path: bool,
    pub fast_path_max_side: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fast_path: true,
            fast_path_max_side: DEFAULT_FAST_PATH_MAX_SIDE,
        }
    }
}

/// Why a request went to the full-frame pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    FastPathDisabled,
    DecodeFailed,
    Unclassified,
    NoScore,
    HintConflict,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FallbackReason::FastPathDisabled => "fast path disabled",
            FallbackReason::DecodeFailed => "screenshot could not be decoded",
            FallbackReason::Unclassified => "dashboard not identified from crops",
            FallbackReason::NoScore => "no plausible score in crops",
            FallbackReason::HintConflict => "crops disagree with source hint",
        };
        f.write_str(reason)
    }
}

/// Outcome of the fast-path stage.
#[derive(Clone, Debug, PartialEq)]
pub enum FastPathDecision {
    Done(ExtractionOutcome),
    Fallback {
        reason: FallbackReason,
        /// Handle found in the crops, preferred over the full-pass handle.
        handle: Option<String>,
    },
}

/// Decides whether a fast-path result can stand on its own.
pub fn decide(fast: FastPathResult) -> FastPathDecision {
    if fast.is_successful() {
        return FastPathDecision::Done(ExtractionOutcome {
            source: fast.source,
            score: fast.score,
            handle: fast.handle,
            used_fast_path: true,
        });
    }

    let reason = if fast.hint_conflict {
        FallbackReason::HintConflict
    } else if fast.source == Source::Unknown {
        FallbackReason::Unclassified
    } else {
        FallbackReason::NoScore
    };
    FastPathDecision::Fallback {
        reason,
        handle: fast.handle,
    }
}

pub struct ExtractionPipeline {
    worker: RecognitionWorker,
    gate: AdmissionGate,
    settings: PipelineSettings,
}

impl ExtractionPipeline {
    pub fn new(recognizer: Arc<dyn Recognizer>, settings: PipelineSettings) -> Self {
        Self {
            worker: RecognitionWorker::new(recognizer),
            gate: AdmissionGate::new(settings.concurrency),
            settings,
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Extracts source, score and handle from screenshot bytes.
    pub async fn extract(&self, image: Arc<[u8]>, hint: SourceHint) -> Result<ExtractionOutcome> {
        let _permit = self.gate.admit().await?;

        let decision = self.fast_path(&image, hint).await?;
        let fast_handle = match decision {
            FastPathDecision::Done(outcome) => {
                tracing::info!(
                    source = %outcome.source,
                    score = ?outcome.score,
                    "Extraction finished on fast path"
                );
                return Ok(outcome);
            }
            FastPathDecision::Fallback { reason, handle } => {
                tracing::debug!(%reason, "Falling back to full-frame recognition");
                handle
            }
        };

        let fragments = self
            .worker
            .recognize(ImageInput::Encoded(image), RecognizeOptions::default())
            .await?;

        let mut outcome = analyze_fragments(&fragments, hint);
        if let Some(fixed) = hint.fixed() {
            let detected = classify(&fragments);
            if detected != Source::Unknown && detected != fixed {
                tracing::warn!(
                    hint = %fixed,
                    detected = %detected,
                    "Full frame looks like a different dashboard than the hint, keeping the hint"
                );
            }
        }
        if fast_handle.is_some() {
            outcome.handle = fast_handle;
        }

        tracing::info!(
            source = %outcome.source,
            score = ?outcome.score,
            fragments = fragments.len(),
            "Extraction finished on full frame"
        );
        Ok(outcome)
    }

    /// Extracts and then judges the result against the expected handle.
    pub async fn verify(
        &self,
        image: Arc<[u8]>,
        hint: SourceHint,
        expected_handle: &str,
    ) -> Result<VerificationResult> {
        let outcome = self.extract(image, hint).await?;
        Ok(VerificationResult::new(outcome, expected_handle))
    }

    async fn fast_path(&self, image: &Arc<[u8]>, hint: SourceHint) -> Result<FastPathDecision> {
        if !self.settings.fast_path {
            return Ok(FastPathDecision::Fallback {
                reason: FallbackReason::FastPathDisabled,
                handle: None,
            });
        }

        let Some(decoded) = self
            .worker
            .decode(Arc::clone(image), self.settings.fast_path_max_side)
            .await?
        else {
            return Ok(FastPathDecision::Fallback {
                reason: FallbackReason::DecodeFailed,
                handle: None,
            });
        };

        let fast = run_fast_path(&self.worker, &decoded, hint).await?;
        Ok(decide(fast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::ocr::{BoundingBox, TextFragment, HANDLE_ALLOWLIST, NUMERAL_ALLOWLIST};
    use crate::verify::Tier;
    use anyhow::anyhow;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned text per pass kind and records call counts.
    #[derive(Default)]
    struct FakeRecognizer {
        classify_text: Vec<String>,
        score_text: Vec<String>,
        handle_text: Vec<String>,
        fragments: Vec<TextFragment>,
        fail_full: bool,
        delay: Duration,
        text_calls: AtomicUsize,
        full_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeRecognizer {
        fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.text_calls.load(Ordering::SeqCst) + self.full_calls.load(Ordering::SeqCst)
        }
    }

    impl Recognizer for FakeRecognizer {
        fn recognize(&self, _input: &ImageInput, _options: &RecognizeOptions) -> anyhow::Result<Vec<TextFragment>> {
            self.full_calls.fetch_add(1, Ordering::SeqCst);
            self.enter();
            if self.fail_full {
                return Err(anyhow!("model crashed"));
            }
            Ok(self.fragments.clone())
        }

        fn read_text(&self, _input: &ImageInput, options: &RecognizeOptions) -> anyhow::Result<Vec<String>> {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            self.enter();
            Ok(match options.allowlist {
                None => self.classify_text.clone(),
                Some(NUMERAL_ALLOWLIST) => self.score_text.clone(),
                Some(HANDLE_ALLOWLIST) => self.handle_text.clone(),
                Some(_) => Vec::new(),
            })
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn frag(text: &str, left: f32, top: f32, width: f32, height: f32) -> TextFragment {
        TextFragment::new(BoundingBox::from_origin_size(left, top, width, height), text, 0.9)
    }

    /// "Score" label with a tall "287" and a tiny "2.91" directly below it.
    fn wallchain_fragments() -> Vec<TextFragment> {
        vec![
            frag("@alice", 20.0, 20.0, 80.0, 20.0),
            frag("Wallchain", 300.0, 20.0, 120.0, 24.0),
            frag("Score", 300.0, 200.0, 70.0, 20.0),
            frag("2.91", 320.0, 225.0, 30.0, 10.0),
            frag("287", 295.0, 240.0, 80.0, 60.0),
        ]
    }

    fn screenshot() -> Arc<[u8]> {
        let img = image::RgbaImage::new(300, 450);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes.into()
    }

    fn pipeline(recognizer: Arc<FakeRecognizer>, fast_path: bool, concurrency: usize) -> ExtractionPipeline {
        ExtractionPipeline::new(
            recognizer,
            PipelineSettings {
                concurrency,
                fast_path,
                fast_path_max_side: DEFAULT_FAST_PATH_MAX_SIDE,
            },
        )
    }

    fn wallchain_fast_fake() -> FakeRecognizer {
        FakeRecognizer {
            classify_text: strings(&["Wallchain", "Quack Balance"]),
            score_text: strings(&["287 2.91", "5"]),
            handle_text: strings(&["@alice"]),
            fragments: wallchain_fragments(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fast_path_success_skips_full_pass() {
        let fake = Arc::new(wallchain_fast_fake());
        let outcome = pipeline(fake.clone(), true, 4)
            .extract(screenshot(), SourceHint::Auto)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExtractionOutcome {
                source: Source::Wallchain,
                score: Some("287".to_string()),
                handle: Some("alice".to_string()),
                used_fast_path: true,
            }
        );
        assert_eq!(fake.full_calls.load(Ordering::SeqCst), 0);
        // One classify crop, one score crop, one handle crop.
        assert_eq!(fake.text_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_plausible_score_falls_back_and_keeps_fast_handle() {
        let fake = Arc::new(FakeRecognizer {
            score_text: strings(&["5", "2.91"]),
            handle_text: strings(&["@fromcrop"]),
            ..wallchain_fast_fake()
        });
        let outcome = pipeline(fake.clone(), true, 4)
            .extract(screenshot(), SourceHint::Auto)
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Wallchain);
        assert_eq!(outcome.score.as_deref(), Some("287"));
        assert_eq!(outcome.handle.as_deref(), Some("fromcrop"));
        assert!(!outcome.used_fast_path);
        assert_eq!(fake.full_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unclassified_crops_fall_back() {
        let fake = Arc::new(FakeRecognizer {
            classify_text: strings(&["Leaderboard"]),
            handle_text: Vec::new(),
            ..wallchain_fast_fake()
        });
        let outcome = pipeline(fake.clone(), true, 4)
            .extract(screenshot(), SourceHint::Auto)
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Wallchain);
        assert_eq!(outcome.handle.as_deref(), Some("alice"));
        assert!(!outcome.used_fast_path);
        // Three classify crops, no score crops, two handle crops.
        assert_eq!(fake.text_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_hint_conflict_forces_full_pass_and_hint_wins() {
        let fake = Arc::new(wallchain_fast_fake());
        let outcome = pipeline(fake.clone(), true, 4)
            .extract(screenshot(), SourceHint::Fixed(Source::Kaito))
            .await
            .unwrap();

        assert_eq!(outcome.source, Source::Kaito);
        assert_eq!(outcome.score, None);
        assert!(!outcome.used_fast_path);
        assert_eq!(fake.full_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_matching_hint_uses_fast_path() {
        let fake = Arc::new(wallchain_fast_fake());
        let outcome = pipeline(fake.clone(), true, 4)
            .extract(screenshot(), SourceHint::Fixed(Source::Wallchain))
            .await
            .unwrap();

        assert!(outcome.used_fast_path);
        assert_eq!(outcome.score.as_deref(), Some("287"));
    }

    #[tokio::test]
    async fn test_undecodable_bytes_skip_fast_path() {
        let fake = Arc::new(wallchain_fast_fake());
        let outcome = pipeline(fake.clone(), true, 4)
            .extract(Arc::from(&b"not an image"[..]), SourceHint::Auto)
            .await
            .unwrap();

        assert_eq!(fake.text_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fake.full_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.score.as_deref(), Some("287"));
    }

    #[tokio::test]
    async fn test_recognizer_failure_is_fatal_and_not_retried() {
        let fake = Arc::new(FakeRecognizer {
            fail_full: true,
            ..wallchain_fast_fake()
        });
        let result = pipeline(fake.clone(), false, 4)
            .extract(screenshot(), SourceHint::Auto)
            .await;

        assert!(matches!(result, Err(ExtractError::Recognition(_))));
        assert_eq!(fake.full_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_matching_handle() {
        let fake = Arc::new(wallchain_fast_fake());
        let result = pipeline(fake, false, 4)
            .verify(screenshot(), SourceHint::Auto, "alice")
            .await
            .unwrap();

        assert_eq!(result.outcome.source, Source::Wallchain);
        assert_eq!(result.outcome.score.as_deref(), Some("287"));
        assert_eq!(result.outcome.handle.as_deref(), Some("alice"));
        assert_eq!(result.tier, Tier::Amplifier);
        assert_eq!(result.identity_mismatch, None);
    }

    #[tokio::test]
    async fn test_end_to_end_mismatched_handle() {
        let fake = Arc::new(wallchain_fast_fake());
        let result = pipeline(fake, false, 4)
            .verify(screenshot(), SourceHint::Auto, "bob")
            .await
            .unwrap();

        assert_eq!(result.outcome.score.as_deref(), Some("287"));
        assert_eq!(result.tier, Tier::None);
        assert_eq!(
            result.identity_mismatch.as_deref(),
            Some("Found @alice in image, but your linked account is @bob")
        );
    }

    #[tokio::test]
    async fn test_verify_is_idempotent() {
        let fake = Arc::new(wallchain_fast_fake());
        let pipeline = pipeline(fake, true, 4);
        let bytes = screenshot();

        let first = pipeline.verify(bytes.clone(), SourceHint::Auto, "alice").await.unwrap();
        let second = pipeline.verify(bytes, SourceHint::Auto, "alice").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fast_and_full_paths_agree_on_score() {
        let fast = pipeline(Arc::new(wallchain_fast_fake()), true, 4)
            .extract(screenshot(), SourceHint::Auto)
            .await
            .unwrap();
        let full = pipeline(Arc::new(wallchain_fast_fake()), false, 4)
            .extract(screenshot(), SourceHint::Auto)
            .await
            .unwrap();

        assert!(fast.used_fast_path);
        assert!(!full.used_fast_path);
        assert_eq!(fast.source, full.source);
        assert_eq!(fast.score, full.score);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_bounds_requests_in_flight() {
        let fake = Arc::new(FakeRecognizer {
            delay: Duration::from_millis(100),
            ..wallchain_fast_fake()
        });
        let pipeline = Arc::new(pipeline(fake.clone(), false, 2));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let pipeline = Arc::clone(&pipeline);
            tasks.spawn(async move { pipeline.extract(screenshot(), SourceHint::Auto).await });
        }
        while let Some(joined) = tasks.join_next().await {
            assert!(joined.unwrap().is_ok());
        }

        assert_eq!(fake.full_calls.load(Ordering::SeqCst), 6);
        assert_eq!(fake.max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.gate().available(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_request_stops_issuing_calls() {
        let fake = Arc::new(FakeRecognizer {
            classify_text: Vec::new(),
            delay: Duration::from_millis(400),
            ..wallchain_fast_fake()
        });
        let pipeline = pipeline(fake.clone(), true, 4);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(150), pipeline.extract(screenshot(), SourceHint::Auto)).await;
        assert!(abandoned.is_err());

        // Let the dispatched call finish; nothing new may start.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fake.calls(), 1);
        assert_eq!(pipeline.gate().available(), 4);
    }

    #[test]
    fn test_decide_reasons() {
        let base = FastPathResult {
            classified: Source::Unknown,
            source: Source::Unknown,
            score: None,
            handle: Some("alice".to_string()),
            hint_conflict: false,
        };
        assert_eq!(
            decide(base.clone()),
            FastPathDecision::Fallback {
                reason: FallbackReason::Unclassified,
                handle: Some("alice".to_string()),
            }
        );

        let no_score = FastPathResult {
            classified: Source::Xeet,
            source: Source::Xeet,
            ..base.clone()
        };
        assert!(matches!(
            decide(no_score),
            FastPathDecision::Fallback {
                reason: FallbackReason::NoScore,
                ..
            }
        ));

        let conflict = FastPathResult {
            classified: Source::Xeet,
            source: Source::Cookie,
            hint_conflict: true,
            ..base
        };
        assert!(matches!(
            decide(conflict),
            FastPathDecision::Fallback {
                reason: FallbackReason::HintConflict,
                ..
            }
        ));
    }
}
