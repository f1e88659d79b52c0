use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{fs, path::PathBuf};

/// Deterministic pseudo-random hashes standing in for hashed keys
#[allow(dead_code)]
pub fn random_hashes(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random()).collect()
}

/// Temporary dump file that is removed when dropped
pub struct TestFile {
    path: PathBuf,
}

impl TestFile {
    /// Create a path in the system temp dir named after the test
    #[allow(dead_code)]
    pub fn new(test_name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "test_bloom_{}_{}.bin",
            test_name,
            std::process::id()
        ));
        Self { path }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

impl Drop for TestFile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}
