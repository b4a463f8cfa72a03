use anyhow::{Result, anyhow};
use battle_types::Challenge;
use rand::Rng;
use std::path::Path;
use tracing::info;

use battle_core::difficulty;

/// The read-only corpus of (prompt, image) pairs rounds are drawn from.
/// Difficulty tiers are computed once at load; `next_challenge` is a
/// uniform random pick.
pub struct ChallengeDataset {
    entries: Vec<Challenge>,
}

impl ChallengeDataset {
    /// Load the two-column CSV (`prompt,image_file`). Prompts may contain
    /// commas; image filenames do not, so the split is on the last comma.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("failed to read dataset {}: {}", path.as_ref().display(), e))?;
        Self::from_csv(&content)
    }

    pub fn from_csv(content: &str) -> Result<Self> {
        let entries: Vec<Challenge> = content
            .lines()
            .skip(1) // header
            .filter(|line| !line.trim().is_empty())
            .filter_map(Self::parse_line)
            .collect();

        if entries.is_empty() {
            return Err(anyhow!("challenge dataset is empty"));
        }

        info!("Loaded {} challenge dataset entries", entries.len());
        Ok(Self { entries })
    }

    fn parse_line(line: &str) -> Option<Challenge> {
        let (prompt, image_file) = line.rsplit_once(',')?;
        let prompt = prompt.trim().trim_matches('"');
        let image_file = image_file.trim();
        if prompt.is_empty() || image_file.is_empty() {
            return None;
        }

        // Stored paths may point into the image tree; only the file name
        // matters for the serving route.
        let filename = image_file.rsplit('/').next().unwrap_or(image_file);
        let (tier, metadata) = difficulty::analyze(prompt);

        Some(Challenge {
            target_text: prompt.to_string(),
            image_path: format!("/api/images/{filename}"),
            difficulty: tier,
            metadata,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_challenge(&self) -> Challenge {
        let index = rand::thread_rng().gen_range(0..self.entries.len());
        self.entries[index].clone()
    }
}
