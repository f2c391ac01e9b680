use anyhow::{Context, Result};
use bevy::log::info;
use std::path::Path;

use crate::config::SceneConfig;
use crate::plot::HorizonGrid;

pub fn load_scene_config(path: &Path) -> Result<SceneConfig> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = std::io::BufReader::new(file);
    let config: SceneConfig =
        serde_json::from_reader(reader).with_context(|| format!("Failed to parse {:?}", path))?;
    info!("Loaded scene config from {}", path.display());
    Ok(config)
}

pub fn save_scene_config(path: &Path, config: &SceneConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Saved scene config to {}", path.display());
    Ok(())
}

/// One line per sample: `height_m,refraction,horizon_km`.
pub fn write_grid_csv(path: &Path, grid: &HorizonGrid) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    writer.write_record(["height_m", "refraction", "horizon_km"])?;
    let mut rows = 0;
    for (h, k, d) in grid.rows() {
        writer.serialize((h, k, d))?;
        rows += 1;
    }
    writer.flush()?;
    info!("Exported {} horizon samples to {}", rows, path.display());
    Ok(rows)
}
