use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const BREACH_DIR: &str = ".breach";
pub const CONFIG_FILE: &str = ".breach/config.yaml";
pub const SAVE_FILE: &str = ".breach/save.yaml";
pub const WORLD_FILE: &str = ".breach/world.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn breach_dir(root: &Path) -> PathBuf {
    root.join(BREACH_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn save_path(root: &Path) -> PathBuf {
    root.join(SAVE_FILE)
}

pub fn world_override_path(root: &Path) -> PathBuf {
    root.join(WORLD_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/game");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/game/.breach/config.yaml")
        );
        assert_eq!(save_path(root), PathBuf::from("/tmp/game/.breach/save.yaml"));
        assert_eq!(breach_dir(root), PathBuf::from("/tmp/game/.breach"));
    }
}
