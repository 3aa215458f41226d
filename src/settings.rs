use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::advice::DEFAULT_MODEL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceSettings {
    pub enabled: bool,
    pub model: String,
}

impl Default for AdviceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_MODEL.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserSettings {
    camera_index: u32,
    advice: AdviceSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            advice: AdviceSettings::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn camera_index(&self) -> u32 {
        self.data.read().unwrap().camera_index
    }

    pub fn update_camera_index(&self, camera_index: u32) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.camera_index = camera_index;
            self.persist(&guard)?;
        }
        Ok(())
    }

    pub fn advice(&self) -> AdviceSettings {
        self.data.read().unwrap().advice.clone()
    }

    pub fn update_advice(&self, settings: AdviceSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.advice = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl SettingsStore {
    #[allow(dead_code)]
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }
}
