use anyhow::Context;
use breach_core::config::GameConfig;
use breach_core::content::WorldContent;
use breach_core::paths;
use breach_core::save::SaveGame;
use breach_core::types::DifficultyLevel;
use std::path::Path;

pub fn run(root: &Path, difficulty: Option<DifficultyLevel>) -> anyhow::Result<()> {
    println!("Initializing breach in: {}", root.display());

    let dir = paths::breach_dir(root);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let mut config = GameConfig::load(root).context("failed to load config.yaml")?;
    let config_existed = config_path.exists();
    if let Some(d) = difficulty {
        config.difficulty = d;
    }
    if !config_existed || difficulty.is_some() {
        config.save(root).context("failed to write config.yaml")?;
        println!("  {}: {}", if config_existed { "updated" } else { "created" }, paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    if paths::save_path(root).exists() {
        println!("  exists:  {}", paths::SAVE_FILE);
    } else {
        let content = WorldContent::load(root).context("failed to load world content")?;
        SaveGame::new_game(&content, config.difficulty)
            .save(root)
            .context("failed to write save.yaml")?;
        println!("  created: {}", paths::SAVE_FILE);
    }

    println!("\nDifficulty: {}. Run 'breach play' to start.", config.difficulty);
    Ok(())
}
