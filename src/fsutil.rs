use dirs::data_local_dir;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn cache_root() -> PathBuf {
    let mut root = data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    root.push("bodega");
    root.push("cache");
    root.push("v1");
    root
}

pub fn ensure_dir(p: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(p)
}

/// Copy a directory tree file-by-file, preserving permissions. Symlinks are
/// not followed.
pub fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        let perms = entry
            .metadata()
            .map_err(std::io::Error::other)?
            .permissions();
        fs::set_permissions(&dest, perms)?;
    }
    Ok(())
}
