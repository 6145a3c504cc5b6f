// Core modules
pub mod config;
pub mod error;
pub mod loader;
pub mod path;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use config::{RendererOptions, WhitespaceOptions};
pub use error::{Result, TemplateError};
pub use loader::{FsLoader, FsResolver, Loader, MemoryTemplates, Resolver};
pub use template::{Rendered, Renderer};
pub use value::Vars;
