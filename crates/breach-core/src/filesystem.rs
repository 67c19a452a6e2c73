use crate::error::{BreachError, Result};
use serde::{Deserialize, Serialize};

/// Directory skeleton of a remote host. File contents live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileSystem {
    pub host_id: String,
    #[serde(default)]
    pub directories: Vec<String>,
}

/// The remote filesystem the shell currently operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveMount {
    pub host_id: String,
    pub username: String,
    pub cwd: String,
}

pub fn home_dir(username: &str) -> String {
    format!("/home/{username}")
}

#[derive(Debug, Clone, Default)]
pub struct FileSystems {
    systems: Vec<RemoteFileSystem>,
    active: Option<ActiveMount>,
}

impl FileSystems {
    pub fn new(systems: Vec<RemoteFileSystem>) -> Self {
        Self {
            systems,
            active: None,
        }
    }

    pub fn resolve(&self, host_id: &str) -> Option<&RemoteFileSystem> {
        self.systems.iter().find(|fs| fs.host_id == host_id)
    }

    /// Mount `host_id` with the session user's home as working directory,
    /// creating the home directory if the skeleton lacks it.
    pub fn activate(&mut self, host_id: &str, username: &str) -> Result<()> {
        let home = home_dir(username);
        let fs = self
            .systems
            .iter_mut()
            .find(|fs| fs.host_id == host_id)
            .ok_or_else(|| BreachError::FileSystemMissing(host_id.to_string()))?;
        if !fs.directories.contains(&home) {
            fs.directories.push(home.clone());
        }
        self.active = Some(ActiveMount {
            host_id: host_id.to_string(),
            username: username.to_string(),
            cwd: home,
        });
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&ActiveMount> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn systems() -> FileSystems {
        FileSystems::new(vec![RemoteFileSystem {
            host_id: "box".into(),
            directories: vec!["/".into()],
        }])
    }

    #[test]
    fn activate_sets_home_as_cwd() {
        let mut fs = systems();
        fs.activate("box", "alice").unwrap();
        let mount = fs.active().unwrap();
        assert_eq!(mount.cwd, "/home/alice");
        assert!(fs.resolve("box").unwrap().directories.contains(&"/home/alice".to_string()));
    }

    #[test]
    fn activate_unknown_host_fails() {
        let mut fs = systems();
        assert!(matches!(
            fs.activate("nope", "alice"),
            Err(BreachError::FileSystemMissing(_))
        ));
        assert!(fs.active().is_none());
    }

    #[test]
    fn activating_twice_does_not_duplicate_home() {
        let mut fs = systems();
        fs.activate("box", "alice").unwrap();
        fs.deactivate();
        fs.activate("box", "alice").unwrap();
        let dirs = &fs.resolve("box").unwrap().directories;
        assert_eq!(dirs.iter().filter(|d| *d == "/home/alice").count(), 1);
    }
}
