#[cfg(test)]
pub mod fixtures {
    use crate::config::Config;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Temporary downloads + library layout with a matching config
    pub struct TestLibrary {
        pub temp_dir: TempDir,
        pub downloads: PathBuf,
        pub library: PathBuf,
        pub config: Config,
    }

    impl TestLibrary {
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("create temp dir");
            let downloads = temp_dir.path().join("downloads");
            let library = temp_dir.path().join("library");
            fs::create_dir_all(&downloads).expect("create downloads");

            let mut config = Config::default();
            config.core.state_path = temp_dir.path().join("state/monitored.json");
            config.core.destination_root = library.clone();

            Self {
                temp_dir,
                downloads,
                library,
                config,
            }
        }

        /// Creates a small media file below the downloads directory
        pub fn add_download(&self, relative: &str) -> PathBuf {
            let path = self.downloads.join(relative);
            touch(&path);
            path
        }
    }

    /// Writes a small file, creating parent directories
    pub fn touch(path: &Path) {
        fs::create_dir_all(path.parent().expect("path has parent")).expect("create parents");
        fs::write(path, b"media").expect("write file");
    }
}
