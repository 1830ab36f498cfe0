//! Logging helpers
//!
//! Translates [`LoggingConfig`](crate::config::LoggingConfig) into
//! `tracing-subscriber` filter directives. Components map onto this crate's
//! module paths, so `stream = "debug"` becomes `observatory::stream=debug`.

/// Build filter directives string from LoggingConfig
///
/// # Examples
///
/// ```
/// use observatory::config::{LogFormat, LoggingConfig};
/// use observatory::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("stream".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
///     log_frames: false,
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,observatory::stream=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        // Sorted so the directive string is stable across runs
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",observatory::{}={}", component, level));
        }
    }

    // Raw frames are logged at trace inside the engine
    if config.log_frames {
        filter_str.push_str(",observatory::engine=trace");
    }

    filter_str
}
