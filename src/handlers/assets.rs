//! Catch-all handler serving the bundled viewer client.
//!
//! Any GET that matched no API route falls through to the client entry
//! point, so deep links into the single-page viewer work.

use crate::state::AppState;
use actix_files::NamedFile;
use actix_web::web;
use std::path::PathBuf;

pub async fn spa_index(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    let static_dir = state.get_config().server.static_dir;
    let index: PathBuf = [static_dir.as_str(), "index.html"].iter().collect();
    Ok(NamedFile::open_async(index).await?)
}
