use breach_core::paths::BREACH_DIR;
use std::path::{Path, PathBuf};

/// Resolve the game root directory.
///
/// Priority:
/// 1. `--root` flag / `BREACH_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.breach/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_game_dir(&cwd).unwrap_or(cwd)
}

fn find_game_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(BREACH_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_game_dir_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".breach")).unwrap();
        let deep = dir.path().join("loot/deep");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_game_dir(&deep).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_game_dir() {
        let dir = TempDir::new().unwrap();
        assert!(find_game_dir(dir.path()).is_none());
    }
}
