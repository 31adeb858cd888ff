//! Settings for focus highlighting.
//!
//! Settings live under the `limelight` namespace of the host's configuration. Each key is read
//! independently so that one malformed value does not throw away the others: a value that fails
//! to deserialize or validate is reported and replaced by its default.

use crate::error::FocusError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Configuration namespace owned by this crate.
pub const NAMESPACE: &str = "limelight";

/// How the focus region is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockDetection {
    /// Use paragraph (blank-line delimited) or selection based focus.
    #[default]
    Paragraph,
    /// Use the innermost document symbol enclosing the caret.
    DocumentSymbols,
}

/// Complete, validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusConfig {
    /// Opacity applied to dimmed lines, in `[0, 1]`.
    pub dim_opacity: f64,
    /// Extra lines above and below the viewport that also get dimmed.
    pub buffer_lines: usize,
    /// Focus detection strategy.
    pub block_detection: BlockDetection,
    /// In paragraph detection, focus the whole paragraph rather than the selected lines.
    pub paragraph_mode: bool,
    /// Only dim while zen mode is active.
    pub only_in_zen_mode: bool,
    /// Clear dimming while the user scrolls quickly.
    pub disable_while_scrolling: bool,
    /// Quiet period after the last scroll event before dimming is restored.
    pub scroll_debounce_delay_ms: u64,
    /// Scroll speed, in lines per millisecond, above which a sample counts as fast.
    pub scroll_velocity_threshold: f64,
    /// Emit decision-level debug logs.
    pub enable_logging: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            dim_opacity: 0.3,
            buffer_lines: 50,
            block_detection: BlockDetection::Paragraph,
            paragraph_mode: true,
            only_in_zen_mode: false,
            disable_while_scrolling: true,
            scroll_debounce_delay_ms: 150,
            scroll_velocity_threshold: 0.5,
            enable_logging: false,
        }
    }
}

/// Key/value access to the host's settings.
pub trait ConfigSource {
    /// Look up a fully qualified key such as `limelight.dimOpacity`.
    fn get(&self, key: &str) -> Option<Value>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for Rc<RefCell<T>> {
    fn get(&self, key: &str) -> Option<Value> {
        self.borrow().get(key)
    }
}

/// A [`ConfigSource`] backed by a JSON settings object.
///
/// Both the flat VS Code style (`{"limelight.dimOpacity": 0.5}`) and a nested section
/// (`{"limelight": {"dimOpacity": 0.5}}`) are understood; flat keys take precedence.
#[derive(Debug, Clone, Default)]
pub struct JsonSettings {
    root: Value,
}

impl JsonSettings {
    /// Wrap a parsed settings object.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, FocusError> {
        serde_json::from_str(text)
            .map(Self::new)
            .map_err(|err| FocusError::Config {
                key: NAMESPACE.to_string(),
                message: err.to_string(),
            })
    }

    /// Replace one value, as a settings UI would.
    pub fn set(&mut self, key: &str, value: Value) {
        if !self.root.is_object() {
            self.root = Value::Object(Default::default());
        }
        if let Value::Object(map) = &mut self.root {
            map.insert(key.to_string(), value);
        }
    }
}

impl ConfigSource for JsonSettings {
    fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.root.get(key) {
            return Some(value.clone());
        }
        let (section, name) = key.split_once('.')?;
        self.root.get(section)?.get(name).cloned()
    }
}

/// A configuration change notification, keyed by the namespace it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    /// Affected section, e.g. `limelight` or `editor.fontSize`.
    pub section: String,
}

impl ConfigChange {
    /// Create a change notification for `section`.
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }

    /// Returns true if the change touches `namespace` (the namespace itself or a key inside it).
    pub fn affects(&self, namespace: &str) -> bool {
        self.section == namespace
            || self
                .section
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl FocusConfig {
    /// Read every setting from `source`, falling back to defaults key by key.
    pub fn load(source: &dyn ConfigSource) -> Self {
        let defaults = Self::default();
        let mut config = Self {
            dim_opacity: read(source, "dimOpacity", defaults.dim_opacity),
            buffer_lines: read(source, "bufferLines", defaults.buffer_lines),
            block_detection: read(source, "blockDetection", defaults.block_detection),
            paragraph_mode: read(source, "paragraphMode", defaults.paragraph_mode),
            only_in_zen_mode: read(source, "onlyInZenMode", defaults.only_in_zen_mode),
            disable_while_scrolling: read(
                source,
                "disableWhileScrolling",
                defaults.disable_while_scrolling,
            ),
            scroll_debounce_delay_ms: read(
                source,
                "scrollDebounceDelayMs",
                defaults.scroll_debounce_delay_ms,
            ),
            scroll_velocity_threshold: read(
                source,
                "scrollVelocityThreshold",
                defaults.scroll_velocity_threshold,
            ),
            enable_logging: read(source, "enableLogging", defaults.enable_logging),
        };
        for err in config.normalize() {
            tracing::warn!(error = %err, "using default for invalid setting");
        }
        config
    }

    /// Clamp or reset out-of-range values, returning one error per corrected key.
    pub fn normalize(&mut self) -> Vec<FocusError> {
        let defaults = Self::default();
        let mut problems = Vec::new();

        if self.dim_opacity.is_nan() {
            problems.push(invalid("dimOpacity", "not a number"));
            self.dim_opacity = defaults.dim_opacity;
        } else if !(0.0..=1.0).contains(&self.dim_opacity) {
            problems.push(invalid("dimOpacity", "must be between 0 and 1"));
            self.dim_opacity = self.dim_opacity.clamp(0.0, 1.0);
        }

        let threshold = self.scroll_velocity_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            problems.push(invalid(
                "scrollVelocityThreshold",
                "must be a positive number",
            ));
            self.scroll_velocity_threshold = defaults.scroll_velocity_threshold;
        }

        problems
    }
}

fn read<T: DeserializeOwned>(source: &dyn ConfigSource, name: &str, default: T) -> T {
    let key = format!("{NAMESPACE}.{name}");
    let Some(value) = source.get(&key) else {
        return default;
    };
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(%key, error = %err, "ignoring malformed setting");
            default
        }
    }
}

fn invalid(name: &str, message: &str) -> FocusError {
    FocusError::Config {
        key: format!("{NAMESPACE}.{name}"),
        message: message.to_string(),
    }
}
