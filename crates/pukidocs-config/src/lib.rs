//! Site configuration for pukidocs.
//!
//! The configuration file follows the MkDocs `mkdocs.yml` layout: theme,
//! plugins (with the `i18n` localization plugin), markdown extensions,
//! free-form `extra` data and the navigation tree.

pub mod nav;
pub mod site;
pub mod skeleton;
pub mod validate;

pub use nav::{NavEntry, NavPage};
pub use site::{
    ConfigError, I18nOptions, LanguageConfig, Locale, NamedEntry, SiteConfig, ThemeConfig,
    CONFIG_FILENAME,
};
pub use skeleton::skeleton;
pub use validate::{validate, Issue};
