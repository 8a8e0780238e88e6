//! Concurrent fan-out of try-on renders.
//!
//! Every image is an independent request. All of them are started at once
//! and joined; the first failure fails the whole batch and whatever already
//! finished is dropped.

use crate::error::Result;
use crate::image::{GeneratedImage, InlineImage, TryOnProvider, TryOnRequest};
use crate::options::TryOnOptions;
use crate::prompt::compose_prompt;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Instant;

/// Reported each time one render of a batch finishes successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Position of the finished render within the batch (0-based).
    pub index: usize,
    /// Renders finished so far, including this one.
    pub completed: usize,
    /// Renders requested.
    pub total: usize,
}

impl Progress {
    /// True once every render has finished.
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

/// Builds the per-image request shared by every render of a batch.
pub fn build_request(
    person: &InlineImage,
    garment: &InlineImage,
    options: &TryOnOptions,
) -> TryOnRequest {
    TryOnRequest::new(
        person.clone(),
        garment.clone(),
        compose_prompt(options.aspect_ratio, &options.instructions),
        options.aspect_ratio,
    )
}

/// Requests `options.count` renders concurrently and returns them in
/// request order.
pub async fn generate_try_on_images<P>(
    provider: &P,
    person: &InlineImage,
    garment: &InlineImage,
    options: &TryOnOptions,
) -> Result<Vec<GeneratedImage>>
where
    P: TryOnProvider + ?Sized,
{
    options.validate()?;
    let request = build_request(person, garment, options);
    let start = Instant::now();

    tracing::info!(
        provider = provider.name(),
        count = options.count,
        aspect_ratio = %options.aspect_ratio,
        "generating try-on images"
    );

    let renders = (0..options.count).map(|_| provider.render(&request));
    let images = futures::future::try_join_all(renders)
        .await
        .inspect_err(|e| tracing::warn!("try-on generation failed: {e}"))?;

    tracing::info!(
        count = images.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "try-on generation complete"
    );
    Ok(images)
}

/// Same as [`generate_try_on_images`], calling `on_progress` as each render
/// lands so callers can fill in placeholders while the rest are pending.
///
/// Returns on the first error without waiting for the remaining renders.
pub async fn generate_with_progress<P, F>(
    provider: &P,
    person: &InlineImage,
    garment: &InlineImage,
    options: &TryOnOptions,
    mut on_progress: F,
) -> Result<Vec<GeneratedImage>>
where
    P: TryOnProvider + ?Sized,
    F: FnMut(Progress),
{
    options.validate()?;
    let request = build_request(person, garment, options);
    let total = options.count as usize;
    let start = Instant::now();

    tracing::info!(
        provider = provider.name(),
        count = total,
        aspect_ratio = %options.aspect_ratio,
        "generating try-on images"
    );

    let request = &request;
    let mut pending: FuturesUnordered<_> = (0..total)
        .map(|index| async move { (index, provider.render(request).await) })
        .collect();

    let mut slots: Vec<Option<GeneratedImage>> = vec![None; total];
    let mut completed = 0;

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(image) => {
                slots[index] = Some(image);
                completed += 1;
                tracing::debug!(index, completed, total, "try-on render finished");
                on_progress(Progress {
                    index,
                    completed,
                    total,
                });
            }
            Err(e) => {
                tracing::warn!(index, "try-on generation failed: {e}");
                return Err(e);
            }
        }
    }

    tracing::info!(
        count = total,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "try-on generation complete"
    );
    Ok(slots.into_iter().flatten().collect())
}
