//! Built-in plugins.

pub mod file_extensions;

pub use file_extensions::{
    EsmSetting, ExtensionSetting, FileExtensionsOptions, FileExtensionsPlugin,
};
