// Keybindings for the mediaview overlay
// Maps raw keyboard and pointer input onto viewer actions
//
// Keybindings:
// - Escape: Close viewer
// - ArrowRight / ArrowLeft: Next / previous item
// - +: Zoom in
// - -: Zoom out
// - r: Rotate a quarter turn
// - f: Toggle favorite on current item
// - Pointer down on media, move, up/leave: Pan
// - Click on empty backdrop: Close viewer

use crate::viewer::ViewerAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Char(char),
}

/// What the pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Media,
    Backdrop,
    /// Toolbar, thumbnail strip or edit panel; they dispatch their own actions.
    Controls,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    PointerDown {
        x: f64,
        y: f64,
        target: PointerTarget,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp,
    PointerLeave,
    Click(PointerTarget),
}

/// Input to action table.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keybindings;

impl Keybindings {
    pub fn new() -> Self {
        Self
    }

    /// Returns the action bound to `event`, if any.
    pub fn resolve(&self, event: InputEvent) -> Option<ViewerAction> {
        match event {
            InputEvent::Key(key) => self.resolve_key(key),
            InputEvent::PointerDown {
                x,
                y,
                target: PointerTarget::Media,
            } => Some(ViewerAction::BeginPan { x, y }),
            InputEvent::PointerDown { .. } => None,
            InputEvent::PointerMove { x, y } => Some(ViewerAction::Pan { x, y }),
            InputEvent::PointerUp | InputEvent::PointerLeave => Some(ViewerAction::EndPan),
            InputEvent::Click(PointerTarget::Backdrop) => Some(ViewerAction::Close),
            InputEvent::Click(_) => None,
        }
    }

    fn resolve_key(&self, key: Key) -> Option<ViewerAction> {
        match key {
            Key::Escape => Some(ViewerAction::Close),
            Key::ArrowRight => Some(ViewerAction::Next),
            Key::ArrowLeft => Some(ViewerAction::Prev),
            Key::Char('+') => Some(ViewerAction::ZoomIn),
            Key::Char('-') => Some(ViewerAction::ZoomOut),
            Key::Char('r') => Some(ViewerAction::Rotate),
            Key::Char('f') => Some(ViewerAction::ToggleFavorite),
            Key::Char(_) => None,
        }
    }
}

/// Parses a key name as typed in the terminal driver (`esc`, `left`, `right`, or a single character).
pub fn parse_key(name: &str) -> Option<Key> {
    match name {
        "esc" | "escape" => Some(Key::Escape),
        "left" => Some(Key::ArrowLeft),
        "right" => Some(Key::ArrowRight),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Key::Char(c)),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table() {
        let bindings = Keybindings::new();
        let cases = [
            (Key::Escape, ViewerAction::Close),
            (Key::ArrowRight, ViewerAction::Next),
            (Key::ArrowLeft, ViewerAction::Prev),
            (Key::Char('+'), ViewerAction::ZoomIn),
            (Key::Char('-'), ViewerAction::ZoomOut),
            (Key::Char('r'), ViewerAction::Rotate),
            (Key::Char('f'), ViewerAction::ToggleFavorite),
        ];
        for (key, action) in cases {
            assert_eq!(bindings.resolve(InputEvent::Key(key)), Some(action));
        }
        assert_eq!(bindings.resolve(InputEvent::Key(Key::Char('x'))), None);
    }

    #[test]
    fn test_pointer_table() {
        let bindings = Keybindings::new();
        assert_eq!(
            bindings.resolve(InputEvent::PointerDown {
                x: 1.0,
                y: 2.0,
                target: PointerTarget::Media
            }),
            Some(ViewerAction::BeginPan { x: 1.0, y: 2.0 })
        );
        assert_eq!(
            bindings.resolve(InputEvent::PointerDown {
                x: 1.0,
                y: 2.0,
                target: PointerTarget::Backdrop
            }),
            None
        );
        assert_eq!(
            bindings.resolve(InputEvent::PointerLeave),
            Some(ViewerAction::EndPan)
        );
        assert_eq!(
            bindings.resolve(InputEvent::Click(PointerTarget::Backdrop)),
            Some(ViewerAction::Close)
        );
        assert_eq!(bindings.resolve(InputEvent::Click(PointerTarget::Media)), None);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("esc"), Some(Key::Escape));
        assert_eq!(parse_key("right"), Some(Key::ArrowRight));
        assert_eq!(parse_key("+"), Some(Key::Char('+')));
        assert_eq!(parse_key("zoom"), None);
        assert_eq!(parse_key(""), None);
    }
}
