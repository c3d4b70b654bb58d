/// Repository layer for the JSON documents in the data directory
use crate::domain::{QuickTimes, Settings};
use crate::errors::ApiResult;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub const SETTINGS_FILE: &str = "settings.json";
pub const QTT_FILE: &str = "qtt.json";

/// One JSON document on disk, created with a default payload on first load
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            path: dir.join(file_name),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, writing the default first if the file is absent
    pub async fn load(&self) -> ApiResult<T> {
        if !fs::try_exists(&self.path).await? {
            let value = T::default();
            self.save(&value).await?;
            info!("Created {} with defaults", self.path.display());
            return Ok(value);
        }

        let content = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&content)?)
    }

    pub async fn save(&self, value: &T) -> ApiResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }
        fs::write(&self.path, serde_json::to_vec(value)?).await?;
        Ok(())
    }
}

pub type SettingsRepo = JsonFile<Settings>;
pub type RuleRepo = JsonFile<QuickTimes>;

pub fn settings_repo(dir: &Path) -> SettingsRepo {
    JsonFile::new(dir, SETTINGS_FILE)
}

pub fn rule_repo(dir: &Path) -> RuleRepo {
    JsonFile::new(dir, QTT_FILE)
}

#[cfg(test)]
pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
    use rand::Rng;
    let suffix: u64 = rand::rng().random();
    std::env::temp_dir().join(format!("qtt-{}-{:x}", tag, suffix))
}
