use std::path::{Path, PathBuf};

use crate::{PlayerError, Result};

/// Environment variable naming the artifact root.
pub const ARTIFACTS_DIR_ENV: &str = "ZK_SHUFFLE_ARTIFACTS_DIR";

pub const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";

/// Circuit files needed to prove decryptions and shuffles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleArtifacts {
    pub decrypt_wasm: PathBuf,
    pub decrypt_zkey: PathBuf,
    pub encrypt_wasm: PathBuf,
    pub encrypt_zkey: PathBuf,
}

impl ShuffleArtifacts {
    /// Standard layout: `wasm/{decrypt,encrypt}.wasm` and
    /// `zkey/{decrypt,encrypt}.zkey` below `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            decrypt_wasm: root.join("wasm").join("decrypt.wasm"),
            decrypt_zkey: root.join("zkey").join("decrypt.zkey"),
            encrypt_wasm: root.join("wasm").join("encrypt.wasm"),
            encrypt_zkey: root.join("zkey").join("encrypt.zkey"),
        }
    }

    pub fn from_env() -> Self {
        let root = std::env::var_os(ARTIFACTS_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));
        Self::under(root)
    }

    pub fn paths(&self) -> [&Path; 4] {
        [
            &self.decrypt_wasm,
            &self.decrypt_zkey,
            &self.encrypt_wasm,
            &self.encrypt_zkey,
        ]
    }

    /// Artifacts that do not exist on disk.
    pub fn missing(&self) -> Vec<&Path> {
        self.paths()
            .into_iter()
            .filter(|path| !path.is_file())
            .collect()
    }

    pub fn ensure_present(&self) -> Result<()> {
        match self.missing().first() {
            Some(path) => Err(PlayerError::MissingArtifact(path.to_path_buf())),
            None => Ok(()),
        }
    }
}
