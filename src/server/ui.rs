//! Static front-end.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// `GET /`: the entry page.
pub(super) fn index(static_dir: &Path) -> ServeFile {
    ServeFile::new(static_dir.join("index.html"))
}

/// `GET /static/*`: assets under the static directory.
pub(super) fn assets(static_dir: &Path) -> ServeDir {
    ServeDir::new(static_dir)
}
