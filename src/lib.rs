pub mod config;
pub mod error;
pub mod stache;

pub use config::{load_options, RenderConfig, RenderOptions, SectionPolicy};
pub use error::{Result, StacheError};
pub use stache::compiler::Layout;
pub use stache::host::{Component, Host, Props, Tag, VNode, VirtualDom};
pub use stache::value::{Function, Value};
pub use stache::{compile_layout, compile_templates};
