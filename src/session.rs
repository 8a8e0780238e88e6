//! Try-on session: the uploads, options and results of one user.

use crate::error::{Result, TryOnError};
use crate::gallery::GalleryView;
use crate::generate::{self, Progress};
use crate::image::{GeneratedImage, ImageUpload, TryOnProvider};
use crate::options::TryOnOptions;
use std::path::{Path, PathBuf};

/// State behind a try-on screen.
#[derive(Debug, Default)]
pub struct TryOnSession {
    person: Option<ImageUpload>,
    garment: Option<ImageUpload>,
    /// Generation options; edit freely between runs.
    pub options: TryOnOptions,
    download_dir: PathBuf,
    results: Vec<GeneratedImage>,
    error: Option<String>,
}

impl TryOnSession {
    /// Creates an empty session with default options.
    pub fn new() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            ..Default::default()
        }
    }

    /// Sets where auto-downloaded images are written.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Directory used for auto-download.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Selects the photo of the person.
    pub fn select_person(&mut self, upload: ImageUpload) {
        self.person = Some(upload);
    }

    /// Selects the photo of the garment.
    pub fn select_garment(&mut self, upload: ImageUpload) {
        self.garment = Some(upload);
    }

    /// Removes the person photo.
    pub fn clear_person(&mut self) {
        self.person = None;
    }

    /// Removes the garment photo.
    pub fn clear_garment(&mut self) {
        self.garment = None;
    }

    /// Person photo, if selected.
    pub fn person(&self) -> Option<&ImageUpload> {
        self.person.as_ref()
    }

    /// Garment photo, if selected.
    pub fn garment(&self) -> Option<&ImageUpload> {
        self.garment.as_ref()
    }

    /// Images from the last successful run.
    pub fn results(&self) -> &[GeneratedImage] {
        &self.results
    }

    /// Message from the last failed run.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Both photos are selected.
    pub fn can_generate(&self) -> bool {
        self.person.is_some() && self.garment.is_some()
    }

    /// Gallery state between runs: hidden or ready.
    ///
    /// A run holds the session mutably, so the loading state is only
    /// observable through the progress callback (see [`GalleryView::pending`]).
    pub fn gallery(&self) -> GalleryView {
        GalleryView::new(
            false,
            &self.results,
            self.options.count as usize,
            self.options.aspect_ratio,
        )
    }

    /// Runs one batch with the current options.
    pub async fn generate<P>(&mut self, provider: &P) -> Result<&[GeneratedImage]>
    where
        P: TryOnProvider + ?Sized,
    {
        self.generate_with_progress(provider, |_| {}).await
    }

    /// Runs one batch, reporting each finished render to `on_progress`.
    ///
    /// Previous results and errors are cleared first. If generation fails
    /// nothing from the batch is kept; if auto-download fails the results are
    /// kept. Either way the error message is recorded.
    pub async fn generate_with_progress<P, F>(
        &mut self,
        provider: &P,
        on_progress: F,
    ) -> Result<&[GeneratedImage]>
    where
        P: TryOnProvider + ?Sized,
        F: FnMut(Progress),
    {
        let (Some(person), Some(garment)) = (&self.person, &self.garment) else {
            return Err(TryOnError::InvalidRequest(
                "select both a person photo and a garment photo first".into(),
            ));
        };
        self.error = None;
        self.results.clear();

        let outcome = generate::generate_with_progress(
            provider,
            person.inline(),
            garment.inline(),
            &self.options,
            on_progress,
        )
        .await;

        let result = outcome.and_then(|images| {
            self.results = images;
            if self.options.auto_download {
                let saved = self.download_all(&self.download_dir)?;
                tracing::info!(count = saved.len(), dir = %self.download_dir.display(), "auto-downloaded results");
            }
            Ok(())
        });

        match result {
            Ok(()) => Ok(&self.results),
            Err(e) => {
                self.error = Some(format!("Failed to generate virtual try-on images: {e}"));
                Err(e)
            }
        }
    }

    /// Writes result `index` into `dir` and returns its path.
    pub fn download(&self, index: usize, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let image = self.results.get(index).ok_or_else(|| {
            TryOnError::InvalidRequest(format!(
                "no result {} (have {})",
                index + 1,
                self.results.len()
            ))
        })?;
        image.save_to_dir(dir, index)
    }

    /// Writes every result into `dir`, creating it if needed.
    pub fn download_all(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.results
            .iter()
            .enumerate()
            .map(|(index, image)| image.save_to_dir(dir, index))
            .collect()
    }

    /// Clears uploads, results and errors and restores default options.
    pub fn reset(&mut self) {
        self.person = None;
        self.garment = None;
        self.results.clear();
        self.error = None;
        self.options.reset();
    }
}
