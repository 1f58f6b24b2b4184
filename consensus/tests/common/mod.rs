use serde::de::DeserializeOwned;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

/// Integration tests may run from either the crate folder or the top-level workspace folder
fn resolve(path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.exists() { path.to_path_buf() } else { Path::new("consensus").join(path) }
}

#[allow(dead_code)]
pub fn read_json<T: DeserializeOwned>(file_path: &Path) -> T {
    let reader = BufReader::new(File::open(file_path).unwrap());
    serde_json::from_reader(reader).unwrap_or_else(|e| panic!("malformed fixture {}: {}", file_path.display(), e))
}

/// JSON files in `dir_path`, sorted by name
#[allow(dead_code)]
pub fn json_files(dir_path: &str) -> Vec<PathBuf> {
    let mut paths = fs::read_dir(resolve(dir_path))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}
