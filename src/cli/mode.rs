//! Mode command handlers

use crate::cli::watch::load_config_file;
use crate::cli::{ModeSetArgs, ModeShowArgs};
use crate::config::ObservatoryConfig;
use crate::preferences::{DataSource, FilePreferences, PreferenceStore, SYNTHETIC_MODE_KEY};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Preferences file for a command: explicit flag, else the configured path.
pub fn preferences_path(explicit: Option<&Path>, config: &ObservatoryConfig) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.preferences.path.clone())
}

/// Handle `observatory mode show` command
pub fn handle_mode_show(args: &ModeShowArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_file(&args.config)?.with_env_overrides();
    let store = FilePreferences::new(preferences_path(args.prefs.as_deref(), &config));

    let stored = store.get_bool(SYNTHETIC_MODE_KEY)?;
    let source = DataSource::resolve(None, &store, &config);
    let origin = if stored.is_some() {
        "stored preference"
    } else {
        "config default"
    };

    if args.json {
        return Ok(json!({
            "source": source,
            "stored": stored,
            "preferences": store.path().display().to_string(),
        })
        .to_string());
    }

    Ok(format!("Data source: {} ({})", source, origin))
}

/// Handle `observatory mode set` command
pub fn handle_mode_set(args: &ModeSetArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_file(&args.config)?.with_env_overrides();
    let store = FilePreferences::new(preferences_path(args.prefs.as_deref(), &config));

    let synthetic = args.synthetic.is_on();
    store.set_bool(SYNTHETIC_MODE_KEY, synthetic)?;

    Ok(format!(
        "✓ Synthetic mode {} (saved to {})",
        if synthetic { "enabled" } else { "disabled" },
        store.path().display()
    ))
}
