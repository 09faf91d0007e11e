use crate::errors::{PayoffError, PayoffResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub dashboard_dir: PathBuf,
    pub default_grid_points: usize,
    pub max_grid_points: usize,
    pub max_legs: usize,
    pub std_dev_multiple: f64,
    pub contract_multiplier: f64,
    pub heatmap_half_width: u32,
    pub heatmap_steps: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            dashboard_dir: PathBuf::from("dashboard/dist"),
            default_grid_points: 101,
            max_grid_points: 5001,
            max_legs: 64,
            std_dev_multiple: 3.0,
            contract_multiplier: 100.0,
            heatmap_half_width: 4,
            heatmap_steps: 9,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> PayoffResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> PayoffResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let get = |key: &str, default: String| lookup(key).unwrap_or(default);

        let server_port = get("SERVER_PORT", d.server_port.to_string())
            .parse::<u16>()
            .map_err(|e| PayoffError::Config(format!("SERVER_PORT: {e}")))?;

        let default_grid_points = get("DEFAULT_GRID_POINTS", d.default_grid_points.to_string())
            .parse::<usize>()
            .map_err(|e| PayoffError::Config(format!("DEFAULT_GRID_POINTS: {e}")))?;

        let max_grid_points = get("MAX_GRID_POINTS", d.max_grid_points.to_string())
            .parse::<usize>()
            .map_err(|e| PayoffError::Config(format!("MAX_GRID_POINTS: {e}")))?;

        let max_legs = get("MAX_LEGS", d.max_legs.to_string())
            .parse::<usize>()
            .map_err(|e| PayoffError::Config(format!("MAX_LEGS: {e}")))?;

        let std_dev_multiple = get("STD_DEV_MULTIPLE", d.std_dev_multiple.to_string())
            .parse::<f64>()
            .map_err(|e| PayoffError::Config(format!("STD_DEV_MULTIPLE: {e}")))?;

        let contract_multiplier = get("CONTRACT_MULTIPLIER", d.contract_multiplier.to_string())
            .parse::<f64>()
            .map_err(|e| PayoffError::Config(format!("CONTRACT_MULTIPLIER: {e}")))?;

        let heatmap_half_width = get("HEATMAP_HALF_WIDTH", d.heatmap_half_width.to_string())
            .parse::<u32>()
            .map_err(|e| PayoffError::Config(format!("HEATMAP_HALF_WIDTH: {e}")))?;

        let heatmap_steps = get("HEATMAP_STEPS", d.heatmap_steps.to_string())
            .parse::<usize>()
            .map_err(|e| PayoffError::Config(format!("HEATMAP_STEPS: {e}")))?;

        let cfg = Self {
            server_port,
            dashboard_dir: lookup("DASHBOARD_DIR").map(PathBuf::from).unwrap_or(d.dashboard_dir),
            default_grid_points,
            max_grid_points,
            max_legs,
            std_dev_multiple,
            contract_multiplier,
            heatmap_half_width,
            heatmap_steps,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> PayoffResult<()> {
        if self.default_grid_points < 2 {
            return Err(PayoffError::Config("DEFAULT_GRID_POINTS must be at least 2".into()));
        }
        if self.max_grid_points < self.default_grid_points {
            return Err(PayoffError::Config(
                "MAX_GRID_POINTS must not be below DEFAULT_GRID_POINTS".into(),
            ));
        }
        if self.max_legs == 0 {
            return Err(PayoffError::Config("MAX_LEGS must be positive".into()));
        }
        if !(self.std_dev_multiple.is_finite() && self.std_dev_multiple > 0.0) {
            return Err(PayoffError::Config("STD_DEV_MULTIPLE must be positive".into()));
        }
        if !(self.contract_multiplier.is_finite() && self.contract_multiplier > 0.0) {
            return Err(PayoffError::Config("CONTRACT_MULTIPLIER must be positive".into()));
        }
        if self.heatmap_half_width == 0 || self.heatmap_steps < 2 {
            return Err(PayoffError::Config(
                "HEATMAP_HALF_WIDTH must be positive and HEATMAP_STEPS at least 2".into(),
            ));
        }
        Ok(())
    }
}
