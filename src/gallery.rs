//! Result presentation: placeholders while pending, then the images with a
//! download link each.

use crate::generate::Progress;
use crate::image::{AspectRatio, GeneratedImage};
use std::fmt::Write as _;

/// One finished image in the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    /// Position in the batch (0-based).
    pub index: usize,
    /// Inline `data:` URL of the image.
    pub src: String,
    /// File name offered for download.
    pub download_name: String,
    /// Size of the image in bytes.
    pub size: usize,
}

/// What the result area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryView {
    /// Nothing requested yet, or results were cleared.
    Hidden,
    /// Generation in flight: one placeholder per requested image.
    Loading {
        /// Number of images requested.
        placeholders: usize,
        /// Images finished so far.
        completed: usize,
        /// Shape of each placeholder.
        aspect_ratio: AspectRatio,
    },
    /// Generation finished.
    Ready {
        /// Finished images in request order.
        items: Vec<GalleryItem>,
        /// Shape of each tile.
        aspect_ratio: AspectRatio,
    },
}

impl GalleryView {
    /// Builds the view from the current loading flag and results.
    pub fn new(
        is_loading: bool,
        images: &[GeneratedImage],
        requested: usize,
        aspect_ratio: AspectRatio,
    ) -> Self {
        if is_loading {
            return Self::Loading {
                placeholders: requested,
                completed: 0,
                aspect_ratio,
            };
        }
        if images.is_empty() {
            return Self::Hidden;
        }
        let items = images
            .iter()
            .enumerate()
            .map(|(index, image)| GalleryItem {
                index,
                src: image.to_data_url(),
                download_name: image.download_name(index),
                size: image.size(),
            })
            .collect();
        Self::Ready {
            items,
            aspect_ratio,
        }
    }

    /// Loading view for a batch that is partway through.
    pub fn pending(progress: Progress, aspect_ratio: AspectRatio) -> Self {
        Self::Loading {
            placeholders: progress.total,
            completed: progress.completed,
            aspect_ratio,
        }
    }

    /// True when nothing should be drawn.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Plain-text rendering for a terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Hidden => {}
            Self::Loading {
                placeholders,
                completed,
                aspect_ratio,
            } => {
                let _ = writeln!(out, "Your Virtual Try-On Results ({aspect_ratio})");
                for slot in 0..*placeholders {
                    let (mark, label) = if slot < *completed {
                        ("#", "ready")
                    } else {
                        (".", "generating...")
                    };
                    let _ = writeln!(out, "  [{}] {label}", mark.repeat(8));
                }
                let _ = write!(out, "{completed}/{placeholders} ready");
            }
            Self::Ready {
                items,
                aspect_ratio,
            } => {
                let _ = writeln!(out, "Your Virtual Try-On Results ({aspect_ratio})");
                for item in items {
                    let _ = writeln!(
                        out,
                        "  {}. {} ({} bytes)",
                        item.index + 1,
                        item.download_name,
                        item.size
                    );
                }
                out.pop();
            }
        }
        out
    }

    /// Standalone HTML page showing the gallery.
    pub fn render_html(&self) -> String {
        let mut body = String::new();
        match self {
            Self::Hidden => {}
            Self::Loading {
                placeholders,
                aspect_ratio,
                ..
            } => {
                for _ in 0..*placeholders {
                    let _ = writeln!(
                        body,
                        r#"    <div class="tile placeholder" style="aspect-ratio: {};"></div>"#,
                        aspect_ratio.css_ratio()
                    );
                }
            }
            Self::Ready {
                items,
                aspect_ratio,
            } => {
                for item in items {
                    let n = item.index + 1;
                    let _ = writeln!(
                        body,
                        r#"    <figure class="tile" style="aspect-ratio: {ratio};">
      <img src="{src}" alt="Generated try-on {n}">
      <a href="{src}" download="{name}" aria-label="Download image {n}" title="Download">Download</a>
    </figure>"#,
                        ratio = aspect_ratio.css_ratio(),
                        src = item.src,
                        name = item.download_name,
                    );
                }
            }
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Your Virtual Try-On Results</title>
  <style>
    body {{ background: #111827; color: #fff; font-family: sans-serif; }}
    .grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; }}
    .tile {{ position: relative; margin: 0; background: #1f2937; border-radius: 0.5rem; overflow: hidden; }}
    .tile img {{ width: 100%; height: 100%; object-fit: cover; }}
    .tile a {{ position: absolute; bottom: 0.5rem; right: 0.5rem; color: #fff; background: rgba(0,0,0,.5); padding: 0.25rem 0.5rem; border-radius: 9999px; }}
    .placeholder {{ background: #374151; }}
  </style>
</head>
<body>
  <h2>Your Virtual Try-On Results</h2>
  <div class="grid">
{body}  </div>
</body>
</html>
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{GenerationMetadata, ImageFormat, ProviderKind};

    fn image(format: ImageFormat) -> GeneratedImage {
        GeneratedImage::new(
            vec![1, 2, 3],
            format,
            ProviderKind::Gemini,
            GenerationMetadata::default(),
        )
    }

    #[test]
    fn test_hidden_when_idle_and_empty() {
        let view = GalleryView::new(false, &[], 5, AspectRatio::Portrait);
        assert!(view.is_hidden());
        assert_eq!(view.render_text(), "");
    }

    #[test]
    fn test_loading_shows_one_placeholder_per_request() {
        let view = GalleryView::new(true, &[], 3, AspectRatio::Square);
        assert_eq!(
            view,
            GalleryView::Loading {
                placeholders: 3,
                completed: 0,
                aspect_ratio: AspectRatio::Square
            }
        );
        let text = view.render_text();
        assert_eq!(text.matches("generating...").count(), 3);
        assert!(text.ends_with("0/3 ready"));

        let html = view.render_html();
        assert_eq!(html.matches("tile placeholder").count(), 3);
        assert!(html.contains("aspect-ratio: 1 / 1;"));
    }

    #[test]
    fn test_loading_wins_over_stale_images() {
        let images = vec![image(ImageFormat::Png)];
        let view = GalleryView::new(true, &images, 5, AspectRatio::Portrait);
        assert!(matches!(view, GalleryView::Loading { placeholders: 5, .. }));
    }

    #[test]
    fn test_pending_progress() {
        let progress = Progress {
            index: 0,
            completed: 2,
            total: 5,
        };
        let text = GalleryView::pending(progress, AspectRatio::Portrait).render_text();
        assert_eq!(text.matches("[########]").count(), 2);
        assert_eq!(text.matches("[........]").count(), 3);
        assert!(text.ends_with("2/5 ready"));
    }

    #[test]
    fn test_ready_items_have_download_names() {
        let images = vec![image(ImageFormat::Png), image(ImageFormat::Jpeg)];
        let view = GalleryView::new(false, &images, 2, AspectRatio::Landscape);

        let GalleryView::Ready { items, .. } = &view else {
            panic!("expected ready view");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].download_name, "virtual-try-on-1.png");
        assert_eq!(items[1].download_name, "virtual-try-on-2.jpg");
        assert_eq!(items[1].src, "data:image/jpeg;base64,AQID");

        let text = view.render_text();
        assert_eq!(
            text,
            "Your Virtual Try-On Results (16:9)\n  1. virtual-try-on-1.png (3 bytes)\n  2. virtual-try-on-2.jpg (3 bytes)"
        );
    }

    #[test]
    fn test_html_has_download_links() {
        let images = vec![image(ImageFormat::Png)];
        let html = GalleryView::new(false, &images, 1, AspectRatio::Portrait).render_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"download="virtual-try-on-1.png""#));
        assert!(html.contains(r#"<img src="data:image/png;base64,AQID" alt="Generated try-on 1">"#));
        assert!(html.contains("aspect-ratio: 9 / 16;"));
    }
}
