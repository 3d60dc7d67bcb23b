//! Directory listing and gallery HTML.
//!
//! A gallery page is rendered straight from the filesystem on every request:
//! subdirectories become links to nested galleries, JPEG files become
//! thumbnails linking to the original. Everything else (dotfiles, text files,
//! other image formats) is left out.
//!
//! ```text
//! /trip  →  <ServedRoot>/trip
//!           ├── day2/        →  <a href="/trip/day2">
//!           ├── sunset.jpg   →  <a href="/o/abs/trip/sunset.jpg"><img src="/t/abs/trip/sunset.jpg">
//!           └── note.txt     (omitted)
//! ```

use crate::imaging::is_supported_image;
use maud::{DOCTYPE, Markup, html};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GalleryError {
    /// Whether the directory simply isn't there, as opposed to being unreadable.
    pub fn is_not_found(&self) -> bool {
        match self {
            GalleryError::NotFound(_) => true,
            GalleryError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
        }
    }
}

/// A subdirectory link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirLink {
    pub name: String,
    pub href: String,
}

/// Contents of one directory, split into what a gallery shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Subdirectories, sorted by name.
    pub dirs: Vec<DirLink>,
    /// Absolute paths of JPEG files, sorted by name.
    pub images: Vec<PathBuf>,
}

/// Settings shared by every rendered page.
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub version: String,
}

/// Percent-encode each `/`-separated segment, leaving the separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// List `dir`, which the client addressed as `request_path`.
///
/// `dir` must already have passed the path guard. Subdirectory links are
/// built by appending the entry name to the decoded `request_path` and
/// encoding the result.
pub fn list(dir: &Path, request_path: &str) -> Result<Listing, GalleryError> {
    if !dir.is_dir() {
        return Err(GalleryError::NotFound(dir.to_path_buf()));
    }

    let base = request_path.trim_end_matches('/');
    let mut listing = Listing::default();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            listing.dirs.push(DirLink {
                href: encode_path(&format!("{base}/{name}")),
                name,
            });
        } else if is_supported_image(&path) {
            listing.images.push(path);
        }
    }

    listing.dirs.sort_by(|a, b| a.name.cmp(&b.name));
    listing.images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(listing)
}

// ============================================================================
// HTML
// ============================================================================

const CSS: &str = r#"
body { padding: 5px; font-size: 120%; font-family: sans-serif; }
ol.dirs { display: flex; flex-wrap: wrap; gap: 0.4em; padding: 0; list-style: none; }
ol.dirs a { display: block; padding: 0.3em 0.6em; border: thin dotted black; text-decoration: none; color: white; background-color: #0b5578; }
.thumbs img { object-fit: contain; margin: 2px; }
footer { margin-top: 1em; font-size: 80%; }
"#;

fn base_document(title: &str, settings: &PageSettings, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
                footer {
                    "By "
                    a href="https://github.com/kaihendry/lk" { "lk " (settings.version) }
                }
            }
        }
    }
}

/// Renders the gallery page for a directory.
pub fn render_gallery(listing: &Listing, request_path: &str, settings: &PageSettings) -> Markup {
    let content = html! {
        h1 { (request_path) }
        @if !listing.dirs.is_empty() {
            ol.dirs {
                @for dir in &listing.dirs {
                    li { a href=(dir.href) { (dir.name) } }
                }
            }
        }
        div.thumbs {
            @for image in &listing.images {
                @let abs = image.to_string_lossy();
                @let url = encode_path(&abs);
                a title=(abs) href={ "/o" (url) } {
                    img alt="" loading="lazy"
                        width=(settings.thumb_width)
                        height=(settings.thumb_height)
                        src={ "/t" (url) };
                }
            }
        }
    };

    base_document(request_path, settings, content)
}

/// Renders an error page. Only `message` is shown, never a filesystem path.
pub fn render_error(message: &str, settings: &PageSettings) -> Markup {
    let content = html! {
        h1 { (message) }
        p { a href="/" { "Back to the top" } }
    };

    base_document(message, settings, content)
}
