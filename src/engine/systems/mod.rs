pub mod input_system;

pub use input_system::InputSystem;
