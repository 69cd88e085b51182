pub mod components;
pub mod config;
pub mod loaders;
pub mod rendering;
pub mod systems;
#[cfg(test)]
pub(crate) mod test_support;

pub use components::*;
pub use config::{ AppConfig, Cli, ConfigError, DemoKind };
pub use rendering::Gl;
pub use systems::InputSystem;
