pub mod keybindings;

pub use keybindings::{parse_key, InputEvent, Key, Keybindings, PointerTarget};
