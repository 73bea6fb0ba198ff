//! # Scan Orchestration
//!
//! Async entry points for preprocessing and the multi-photo scan flow.
//!
//! Preprocessing is CPU-bound, so every image runs on the tokio blocking pool.
//! Images in a batch are independent and run concurrently; the batch keeps
//! input order and fails as a whole on the first error, cancelling the images
//! that are still in flight.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use crate::config::PreprocessOptions;
use crate::core::CancelToken;
use crate::error::{PrepError, PrepResult};
use crate::preprocess::{ProcessedImage, Preprocessor, SourceImage};
use crate::vision::{VisionModel, VisionRequest};

/// Preprocesses one source on the blocking pool.
pub async fn preprocess_async(
    source: SourceImage,
    options: PreprocessOptions,
    cancel: CancelToken,
) -> PrepResult<ProcessedImage> {
    let preprocessor = Arc::new(Preprocessor::new(options)?);
    run_blocking(preprocessor, source, cancel).await
}

/// Preprocesses every source concurrently, preserving order.
///
/// The first failure is returned and the remaining images are cancelled
/// through a child of `cancel`, leaving the caller's token untouched.
pub async fn preprocess_batch(
    sources: Vec<SourceImage>,
    options: PreprocessOptions,
    cancel: CancelToken,
) -> PrepResult<Vec<ProcessedImage>> {
    let preprocessor = Arc::new(Preprocessor::new(options)?);
    preprocess_batch_with(preprocessor, sources, cancel).await
}

/// [`preprocess_batch`] with a caller-built [`Preprocessor`] (limits, surface pool).
pub async fn preprocess_batch_with(
    preprocessor: Arc<Preprocessor>,
    sources: Vec<SourceImage>,
    cancel: CancelToken,
) -> PrepResult<Vec<ProcessedImage>> {
    let total = sources.len();
    let batch = cancel.child();

    let jobs = sources.into_iter().enumerate().map(|(index, source)| {
        let preprocessor = Arc::clone(&preprocessor);
        let batch = batch.clone();
        async move {
            let label = source.label().to_string();
            let result = run_blocking(preprocessor, source, batch.clone()).await;
            result.map_err(|e| {
                batch.cancel();
                warn!(image = %label, index, error = %e, "Aborting batch");
                e.with_context(format!("image {} of {total}", index + 1))
            })
        }
    });

    let processed = try_join_all(jobs).await?;
    info!(
        images = processed.len(),
        total_kb = processed.iter().map(|p| p.size_kb).sum::<u32>(),
        "Batch preprocessed"
    );
    Ok(processed)
}

async fn run_blocking(
    preprocessor: Arc<Preprocessor>,
    source: SourceImage,
    cancel: CancelToken,
) -> PrepResult<ProcessedImage> {
    spawn_blocking(move || preprocessor.process(&source, &cancel)).await?
}

/// Result of [`scan_and_analyze`].
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub images: Vec<ProcessedImage>,
    pub text: String,
}

/// Preprocesses a whole scan, then sends it to `model` in one request.
///
/// Nothing is sent unless every image preprocessed successfully.
pub async fn scan_and_analyze(
    model: &dyn VisionModel,
    prompt: &str,
    sources: Vec<SourceImage>,
    options: PreprocessOptions,
    cancel: CancelToken,
) -> PrepResult<ScanOutcome> {
    let preprocessor = Arc::new(Preprocessor::new(options)?);
    scan_and_analyze_with(model, prompt, preprocessor, sources, cancel).await
}

/// [`scan_and_analyze`] with a caller-built [`Preprocessor`].
pub async fn scan_and_analyze_with(
    model: &dyn VisionModel,
    prompt: &str,
    preprocessor: Arc<Preprocessor>,
    sources: Vec<SourceImage>,
    cancel: CancelToken,
) -> PrepResult<ScanOutcome> {
    if sources.is_empty() {
        return Err(PrepError::config("images", "[]", "a scan needs at least one image"));
    }
    let images = preprocess_batch_with(preprocessor, sources, cancel.clone()).await?;
    cancel.check("vision request")?;

    let request = VisionRequest::new(prompt, &images);
    let text = model.generate(&request).await?;
    Ok(ScanOutcome { images, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    fn png(label: &str, w: u32, h: u32) -> SourceImage {
        let img = RgbImage::from_pixel(w, h, Rgb([120, 140, 160]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        SourceImage::from_bytes(label, out.into_inner())
    }

    #[derive(Default)]
    struct RecordingModel {
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl VisionModel for RecordingModel {
        async fn generate(&self, request: &VisionRequest) -> PrepResult<String> {
            self.seen.lock().unwrap().push(request.image_count());
            Ok("3 eggs".to_string())
        }
    }

    #[tokio::test]
    async fn test_preprocess_async() {
        let out = preprocess_async(png("a", 30, 20), PreprocessOptions::new().max_width(15), CancelToken::new())
            .await
            .unwrap();
        assert_eq!((out.width, out.height), (15, 10));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let sources = vec![png("a", 40, 10), png("b", 10, 40), png("c", 20, 20)];
        let out = preprocess_batch(sources, PreprocessOptions::new(), CancelToken::new())
            .await
            .unwrap();
        let dims: Vec<_> = out.iter().map(|p| (p.width, p.height)).collect();
        assert_eq!(dims, vec![(40, 10), (10, 40), (20, 20)]);
    }

    #[tokio::test]
    async fn test_one_bad_image_aborts_the_batch() {
        let sources = vec![
            png("a", 40, 10),
            SourceImage::from_bytes("broken.jpg", b"garbage".to_vec()),
            png("c", 20, 20),
        ];
        let caller = CancelToken::new();
        let err = preprocess_batch(sources, PreprocessOptions::new(), caller.clone())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "decode");
        assert!(err.to_string().contains("broken.jpg"));
        assert_eq!(err.context().context.as_deref(), Some("image 2 of 3"));
        assert!(!caller.is_cancelled());
    }

    #[tokio::test]
    async fn test_scan_sends_all_images_in_one_request() {
        let model = RecordingModel::default();
        let outcome = scan_and_analyze(
            &model,
            "list ingredients",
            vec![png("a", 8, 8), png("b", 8, 8)],
            PreprocessOptions::new(),
            CancelToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.text, "3 eggs");
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(*model.seen.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_scan_with_pooled_preprocessor() {
        use crate::core::SurfacePool;

        let pool = Arc::new(SurfacePool::new(2));
        let preprocessor = Arc::new(
            Preprocessor::new(PreprocessOptions::new().max_width(4))
                .unwrap()
                .with_pool(Arc::clone(&pool)),
        );
        let model = RecordingModel::default();
        let outcome = scan_and_analyze_with(
            &model,
            "list ingredients",
            preprocessor,
            vec![png("a", 8, 8), png("b", 8, 4)],
            CancelToken::new(),
        )
        .await
        .unwrap();
        let dims: Vec<_> = outcome.images.iter().map(|p| (p.width, p.height)).collect();
        assert_eq!(dims, vec![(4, 4), (4, 2)]);
        assert_eq!(*model.seen.lock().unwrap(), vec![2]);
        assert!(pool.stats().0 >= 1);
    }

    #[tokio::test]
    async fn test_failed_preprocessing_sends_nothing() {
        let model = RecordingModel::default();
        let err = scan_and_analyze(
            &model,
            "list ingredients",
            vec![png("a", 8, 8), SourceImage::from_bytes("x", vec![1, 2, 3])],
            PreprocessOptions::new(),
            CancelToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.category(), "decode");
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_scan_is_rejected() {
        let model = RecordingModel::default();
        let err = scan_and_analyze(&model, "p", Vec::new(), PreprocessOptions::new(), CancelToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "config");
    }
}
