//! Toolkit configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::{ToolkitError, ToolkitResult};

/// Environment variable selecting the toolkit family.
pub const TOOLKIT_ENV: &str = "VENEER_TOOLKIT";

/// Environment variable naming the UI thread of loops that spawn their own.
pub const THREAD_NAME_ENV: &str = "VENEER_UI_THREAD_NAME";

/// The native backend family a toolkit engine is built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolkitType {
    Gtk,
    Cocoa,
    Wpf,
    Winit,
    /// No native windowing; used for tests and offscreen tooling.
    Headless,
    Custom(String),
}

impl ToolkitType {
    pub fn as_str(&self) -> &str {
        match self {
            ToolkitType::Gtk => "gtk",
            ToolkitType::Cocoa => "cocoa",
            ToolkitType::Wpf => "wpf",
            ToolkitType::Winit => "winit",
            ToolkitType::Headless => "headless",
            ToolkitType::Custom(name) => name,
        }
    }
}

impl fmt::Display for ToolkitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolkitType {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ToolkitError::InvalidConfig(
                "toolkit name must not be empty".to_string(),
            ));
        }

        Ok(match trimmed.to_ascii_lowercase().as_str() {
            "gtk" => ToolkitType::Gtk,
            "cocoa" => ToolkitType::Cocoa,
            "wpf" => ToolkitType::Wpf,
            "winit" => ToolkitType::Winit,
            "headless" => ToolkitType::Headless,
            other => ToolkitType::Custom(other.to_string()),
        })
    }
}

/// Configuration for building a [`Toolkit`](crate::Toolkit).
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    /// Backend family to activate.
    pub toolkit: ToolkitType,
    /// Run posted work inline while no UI thread is attached.
    ///
    /// When `false` the bridges still run the work inline (they never wait on
    /// a thread that doesn't exist) but log a warning for each occurrence.
    pub inline_when_detached: bool,
    /// Name given to UI threads spawned by the toolkit's own loops.
    pub thread_name: String,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            toolkit: ToolkitType::Headless,
            inline_when_detached: true,
            thread_name: "veneer-ui".to_string(),
        }
    }
}

impl ToolkitConfig {
    /// Defaults overridden by `VENEER_TOOLKIT` and `VENEER_UI_THREAD_NAME`.
    pub fn from_env() -> ToolkitResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ToolkitResult<Self> {
        let mut config = Self::default();

        if let Some(name) = lookup(TOOLKIT_ENV) {
            config.toolkit = name.parse()?;
        }
        if let Some(thread_name) = lookup(THREAD_NAME_ENV) {
            if thread_name.trim().is_empty() {
                return Err(ToolkitError::InvalidConfig(format!(
                    "{} must not be empty",
                    THREAD_NAME_ENV
                )));
            }
            config.thread_name = thread_name;
        }

        Ok(config)
    }

    pub fn with_toolkit(mut self, toolkit: ToolkitType) -> Self {
        self.toolkit = toolkit;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_inline_when_detached(mut self, inline: bool) -> Self {
        self.inline_when_detached = inline;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_toolkits() {
        assert_eq!("GTK".parse::<ToolkitType>().unwrap(), ToolkitType::Gtk);
        assert_eq!(" winit ".parse::<ToolkitType>().unwrap(), ToolkitType::Winit);
        assert_eq!(
            "qt".parse::<ToolkitType>().unwrap(),
            ToolkitType::Custom("qt".to_string())
        );
    }

    #[test]
    fn test_parse_empty_is_invalid() {
        assert!(matches!(
            "  ".parse::<ToolkitType>(),
            Err(ToolkitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = ToolkitConfig::from_lookup(|key| match key {
            TOOLKIT_ENV => Some("cocoa".to_string()),
            THREAD_NAME_ENV => Some("main-ui".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.toolkit, ToolkitType::Cocoa);
        assert_eq!(config.thread_name, "main-ui");
        assert!(config.inline_when_detached);
    }

    #[test]
    fn test_from_lookup_rejects_blank_thread_name() {
        let result = ToolkitConfig::from_lookup(|key| {
            (key == THREAD_NAME_ENV).then(|| String::new())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ToolkitConfig::default();
        assert_eq!(config.toolkit, ToolkitType::Headless);
        assert_eq!(config.thread_name, "veneer-ui");
    }
}
