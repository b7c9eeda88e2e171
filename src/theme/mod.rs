//! Theme variant model: six named palettes, fallback resolution, role
//! schema validation, and the ThemeConfig JSON boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;

pub type ThemeResult<T> = std::result::Result<T, ThemeError>;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("palette for {variant} is missing role {role:?}")]
    SchemaMismatch { variant: VariantName, role: String },
    #[error("palette for {variant} has unknown role {role:?}")]
    UnknownRole { variant: VariantName, role: String },
    #[error("invalid color {value:?} for role {role:?} in {variant}")]
    InvalidColor {
        variant: VariantName,
        role: String,
        value: String,
    },
    #[error("failed to read theme config: {path}")]
    ReadConfig { path: PathBuf, source: io::Error },
    #[error("failed to write theme config: {path}")]
    WriteConfig { path: PathBuf, source: io::Error },
    #[error("failed to parse theme config")]
    ParseConfig(#[from] serde_json::Error),
}

/// One of the six theme variants: light/dark crossed with normal, medium,
/// and high contrast levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariantName {
    #[serde(rename = "light")]
    Light,
    #[serde(rename = "lightMediumContrast")]
    LightMediumContrast,
    #[serde(rename = "lightHighContrast")]
    LightHighContrast,
    #[serde(rename = "dark")]
    Dark,
    #[serde(rename = "darkMediumContrast")]
    DarkMediumContrast,
    #[serde(rename = "darkHighContrast")]
    DarkHighContrast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantGroup {
    Light,
    Dark,
}

impl VariantName {
    /// Fixed enumeration order, also the search order for
    /// [`VariantFlags::first_enabled`].
    pub const ALL: [VariantName; 6] = [
        VariantName::Light,
        VariantName::LightMediumContrast,
        VariantName::LightHighContrast,
        VariantName::Dark,
        VariantName::DarkMediumContrast,
        VariantName::DarkHighContrast,
    ];

    pub const fn group(self) -> VariantGroup {
        match self {
            Self::Light | Self::LightMediumContrast | Self::LightHighContrast => {
                VariantGroup::Light
            }
            Self::Dark | Self::DarkMediumContrast | Self::DarkHighContrast => VariantGroup::Dark,
        }
    }

    /// Next variant in the fallback chain, within the same group. The two
    /// base variants have no fallback; they are always defined.
    pub const fn fallback(self) -> Option<VariantName> {
        match self {
            Self::Light | Self::Dark => None,
            Self::LightMediumContrast => Some(Self::Light),
            Self::LightHighContrast => Some(Self::LightMediumContrast),
            Self::DarkMediumContrast => Some(Self::Dark),
            Self::DarkHighContrast => Some(Self::DarkMediumContrast),
        }
    }

    pub const fn is_base(self) -> bool {
        matches!(self, Self::Light | Self::Dark)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::LightMediumContrast => "lightMediumContrast",
            Self::LightHighContrast => "lightHighContrast",
            Self::Dark => "dark",
            Self::DarkMediumContrast => "darkMediumContrast",
            Self::DarkHighContrast => "darkHighContrast",
        }
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name to hex color string. Values keep the casing the user or the
/// config supplied; they are validated, not normalized.
pub type ColorPalette = BTreeMap<String, String>;

/// The closed set of color-role names a theme must define for every
/// variant palette. Order is the display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSchema {
    roles: Vec<String>,
}

const STANDARD_ROLES: &[&str] = &[
    "primary",
    "onPrimary",
    "secondary",
    "onSecondary",
    "tertiary",
    "onTertiary",
    "background",
    "onBackground",
    "surface",
    "onSurface",
    "error",
    "onError",
];

impl RoleSchema {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// The default Material-style role set.
    pub fn standard() -> Self {
        Self::new(STANDARD_ROLES.iter().copied())
    }

    /// Derive a schema from an existing palette's keys. Useful when the
    /// schema travels with the theme document itself.
    pub fn from_palette(palette: &ColorPalette) -> Self {
        Self::new(palette.keys().cloned())
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Fail fast on any deviation from the closed role set.
    fn validate(&self, variant: VariantName, palette: &ColorPalette) -> ThemeResult<()> {
        for role in &self.roles {
            let value = palette.get(role).ok_or_else(|| ThemeError::SchemaMismatch {
                variant,
                role: role.clone(),
            })?;
            if Rgb::parse(value).is_err() {
                return Err(ThemeError::InvalidColor {
                    variant,
                    role: role.clone(),
                    value: value.clone(),
                });
            }
        }
        for role in palette.keys() {
            if !self.contains(role) {
                return Err(ThemeError::UnknownRole {
                    variant,
                    role: role.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Which variants the host UI may select. Absent settings mean no gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFlags {
    #[serde(rename = "lightMode")]
    pub light_mode: bool,
    #[serde(rename = "lightMedium")]
    pub light_medium: bool,
    #[serde(rename = "lightHigh")]
    pub light_high: bool,
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
    #[serde(rename = "darkMedium")]
    pub dark_medium: bool,
    #[serde(rename = "darkHigh")]
    pub dark_high: bool,
}

impl Default for VariantFlags {
    fn default() -> Self {
        Self {
            light_mode: true,
            light_medium: true,
            light_high: true,
            dark_mode: true,
            dark_medium: true,
            dark_high: true,
        }
    }
}

impl VariantFlags {
    pub const fn is_enabled(self, variant: VariantName) -> bool {
        match variant {
            VariantName::Light => self.light_mode,
            VariantName::LightMediumContrast => self.light_medium,
            VariantName::LightHighContrast => self.light_high,
            VariantName::Dark => self.dark_mode,
            VariantName::DarkMediumContrast => self.dark_medium,
            VariantName::DarkHighContrast => self.dark_high,
        }
    }

    /// The preferred variant when enabled, otherwise the first enabled
    /// variant in enumeration order. Degrades to `light` when every flag
    /// is off.
    pub fn first_enabled(self, preferred: VariantName) -> VariantName {
        if self.is_enabled(preferred) {
            return preferred;
        }
        VariantName::ALL
            .into_iter()
            .find(|variant| self.is_enabled(*variant))
            .unwrap_or(VariantName::Light)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSettings {
    #[serde(rename = "themeVariants")]
    pub theme_variants: VariantFlags,
}

/// The `colors` object of a ThemeConfig document. `light` and `dark` are
/// required; the four contrast levels are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantColors {
    pub light: ColorPalette,
    #[serde(
        default,
        rename = "lightMediumContrast",
        skip_serializing_if = "Option::is_none"
    )]
    pub light_medium_contrast: Option<ColorPalette>,
    #[serde(
        default,
        rename = "lightHighContrast",
        skip_serializing_if = "Option::is_none"
    )]
    pub light_high_contrast: Option<ColorPalette>,
    pub dark: ColorPalette,
    #[serde(
        default,
        rename = "darkMediumContrast",
        skip_serializing_if = "Option::is_none"
    )]
    pub dark_medium_contrast: Option<ColorPalette>,
    #[serde(
        default,
        rename = "darkHighContrast",
        skip_serializing_if = "Option::is_none"
    )]
    pub dark_high_contrast: Option<ColorPalette>,
}

impl VariantColors {
    fn get(&self, variant: VariantName) -> Option<&ColorPalette> {
        match variant {
            VariantName::Light => Some(&self.light),
            VariantName::LightMediumContrast => self.light_medium_contrast.as_ref(),
            VariantName::LightHighContrast => self.light_high_contrast.as_ref(),
            VariantName::Dark => Some(&self.dark),
            VariantName::DarkMediumContrast => self.dark_medium_contrast.as_ref(),
            VariantName::DarkHighContrast => self.dark_high_contrast.as_ref(),
        }
    }
}

/// Serialization shape shared with persistence and sharing collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub colors: VariantColors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ThemeSettings>,
}

/// Owns the defined variant palettes for one editing session and resolves
/// requested variants through the fallback chain.
#[derive(Debug, Clone)]
pub struct ThemeDocument {
    schema: RoleSchema,
    variants: BTreeMap<VariantName, ColorPalette>,
    flags: VariantFlags,
}

impl ThemeDocument {
    /// Validate a config against `schema` and take ownership of its
    /// palettes. Every defined variant must match the schema exactly.
    pub fn from_config(config: ThemeConfig, schema: RoleSchema) -> ThemeResult<Self> {
        let mut variants = BTreeMap::new();
        for variant in VariantName::ALL {
            if let Some(palette) = config.colors.get(variant) {
                schema.validate(variant, palette)?;
                variants.insert(variant, palette.clone());
            }
        }

        let flags = config
            .settings
            .map(|s| s.theme_variants)
            .unwrap_or_default();

        Ok(Self {
            schema,
            variants,
            flags,
        })
    }

    /// Like [`Self::from_config`], with the schema derived from the
    /// required `light` palette.
    pub fn from_config_inferred(config: ThemeConfig) -> ThemeResult<Self> {
        let schema = RoleSchema::from_palette(&config.colors.light);
        Self::from_config(config, schema)
    }

    /// Snapshot the current state as a ThemeConfig-shaped value for
    /// download/export collaborators.
    pub fn to_config(&self) -> ThemeConfig {
        let defined = |variant: VariantName| self.variants.get(&variant).cloned();
        ThemeConfig {
            colors: VariantColors {
                light: self.resolve(VariantName::Light).clone(),
                light_medium_contrast: defined(VariantName::LightMediumContrast),
                light_high_contrast: defined(VariantName::LightHighContrast),
                dark: self.resolve(VariantName::Dark).clone(),
                dark_medium_contrast: defined(VariantName::DarkMediumContrast),
                dark_high_contrast: defined(VariantName::DarkHighContrast),
            },
            settings: Some(ThemeSettings {
                theme_variants: self.flags,
            }),
        }
    }

    pub fn schema(&self) -> &RoleSchema {
        &self.schema
    }

    pub fn flags(&self) -> VariantFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: VariantFlags) {
        self.flags = flags;
    }

    pub fn is_defined(&self, variant: VariantName) -> bool {
        self.variants.contains_key(&variant)
    }

    /// Resolve a variant to a defined palette, walking the fallback chain
    /// when the requested one is undefined. Fallback is a diagnostic, not
    /// an error.
    pub fn resolve(&self, variant: VariantName) -> &ColorPalette {
        let mut current = variant;
        loop {
            if let Some(palette) = self.variants.get(&current) {
                return palette;
            }
            let next = current
                .fallback()
                .expect("base variants are always defined");
            tracing::debug!(
                requested = %variant,
                undefined = %current,
                fallback = %next,
                "variant undefined; resolving through fallback chain"
            );
            current = next;
        }
    }

    /// Current value for a role under fallback resolution.
    pub fn color(&self, variant: VariantName, role: &str) -> Option<&str> {
        self.resolve(variant).get(role).map(String::as_str)
    }

    /// Set exactly one role in exactly one variant. An undefined optional
    /// variant is materialized from its fallback before the first write,
    /// so edits never leak into the ancestor palette.
    pub fn set_color(&mut self, variant: VariantName, role: &str, value: &str) -> ThemeResult<()> {
        if !self.schema.contains(role) {
            return Err(ThemeError::UnknownRole {
                variant,
                role: role.to_string(),
            });
        }
        if Rgb::parse(value).is_err() {
            return Err(ThemeError::InvalidColor {
                variant,
                role: role.to_string(),
                value: value.to_string(),
            });
        }

        if !self.variants.contains_key(&variant) {
            let materialized = self.resolve(variant).clone();
            tracing::debug!(%variant, "materializing variant palette from fallback for first edit");
            self.variants.insert(variant, materialized);
        }

        let palette = self
            .variants
            .get_mut(&variant)
            .expect("variant was just materialized");
        palette.insert(role.to_string(), value.to_string());
        Ok(())
    }
}

pub fn load_theme_config(path: &Path) -> ThemeResult<ThemeConfig> {
    let serialized = fs::read_to_string(path).map_err(|source| ThemeError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&serialized)?;
    Ok(config)
}

pub fn save_theme_config(path: &Path, config: &ThemeConfig) -> ThemeResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ThemeError::WriteConfig {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_json::to_string_pretty(config)?;
    fs::write(path, serialized).map_err(|source| ThemeError::WriteConfig {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
