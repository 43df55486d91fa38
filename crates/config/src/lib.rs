//! Configuration resolution for the hubauth adapter.
//!
//! Properties are looked up through a [`LayeredConfig`]: an ordered list of
//! providers where the first non-empty value wins. Property maps are loaded
//! with figment from YAML and the environment, and the process-wide variable
//! file can be hot-reloaded with notify + arc-swap.

pub mod properties;
pub mod resolver;
pub mod watcher;

pub use properties::PropertyMap;
pub use resolver::{ConfigProvider, LayeredConfig};
pub use watcher::VariableWatcher;
