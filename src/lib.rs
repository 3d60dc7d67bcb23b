//! # lk
//!
//! Browse a directory of photos from any machine on the local network. `lk`
//! serves a directory tree as nested HTML galleries, renders JPEG thumbnails
//! on first view and keeps them on disk so later views are instant.
//!
//! # Request Flow
//!
//! ```text
//! GET /t/home/me/album/trip/sunset.jpg
//!   │
//!   ├─ guard     lexical containment check against the served root
//!   ├─ store     cache hit?  ──yes──▶ stream <cache>/home/me/album/trip/sunset.jpg
//!   │              │ no
//!   └─ imaging   decode → fit into 230×230 → JPEG → temp file → rename
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`guard`] | Resolves request paths under the served root, rejecting escapes |
//! | [`store`] | Deterministic cache paths, cache hits, generation on a miss |
//! | [`imaging`] | Pure-Rust thumbnail pipeline behind the [`imaging::ImageBackend`] trait |
//! | [`gallery`] | Directory listing and Maud-rendered gallery pages |
//! | [`server`] | Axum router: thumbnails, originals, galleries |
//! | [`warm`] | Parallel pre-generation of a whole tree with rayon |
//! | [`config`] | Layered `config.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## The Cache Is Just Files
//!
//! A thumbnail's location is a pure function of its source path, so there is
//! no index to load, corrupt or migrate. A file existing at that location is
//! the only record that generation succeeded. That only holds if nobody can
//! observe a half-written file, which is why [`imaging::create_thumbnail`]
//! writes to a temporary file in the destination directory and renames it
//! into place.
//!
//! Nothing is ever evicted and sources are never re-checked: editing a photo
//! in place keeps serving the old thumbnail until the cache file is removed.
//!
//! ## Escapes Are Not Found
//!
//! A request naming something outside the served root gets the same 404 as a
//! request for a missing file, and the rejected path is never echoed back.

pub mod config;
pub mod gallery;
pub mod guard;
pub mod imaging;
pub mod server;
pub mod store;
pub mod warm;

#[cfg(test)]
pub(crate) mod test_helpers;
