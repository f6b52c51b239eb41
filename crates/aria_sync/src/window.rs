//! Shared window/input state
//!
//! The one piece of cross-thread state that is not a node store: a small
//! struct behind its own short-held lock. Producer tasks read it (and issue
//! [`WindowCommand`]s against it); the consumer thread writes it while
//! applying drained commands; the windowing backend (out of scope) feeds the
//! input fields.

/// Current window and pointer state
#[derive(Clone, Debug, PartialEq)]
pub struct WindowState {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Pointer captured for relative-motion input
    pub mouse_locked: bool,
    /// Last pointer position in logical pixels, fed by the windowing backend
    pub mouse_x: f32,
    pub mouse_y: f32,
    /// Set once a producer requests shutdown; the drain loop owner polls it
    pub close_requested: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            title: "Aria".into(),
            width: 1280,
            height: 720,
            fullscreen: false,
            mouse_locked: false,
            mouse_x: 0.0,
            mouse_y: 0.0,
            close_requested: false,
        }
    }
}

/// Global window/input controls.
///
/// Unlike every other command these target the shared [`WindowState`] rather
/// than a node, so they carry no `NodeId` and can never have a stale target.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowCommand {
    SetTitle(String),
    SetSize { width: u32, height: u32 },
    SetFullscreen(bool),
    SetMouseLock(bool),
    RequestClose,
}

impl WindowCommand {
    /// Apply this control to the shared window state
    pub fn apply(self, window: &mut WindowState) {
        match self {
            Self::SetTitle(title) => window.title = title,
            Self::SetSize { width, height } => {
                window.width = width;
                window.height = height;
            }
            Self::SetFullscreen(on) => window.fullscreen = on,
            Self::SetMouseLock(on) => window.mouse_locked = on,
            Self::RequestClose => window.close_requested = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_controls() {
        let mut w = WindowState::default();
        WindowCommand::SetTitle("demo".into()).apply(&mut w);
        WindowCommand::SetSize {
            width: 640,
            height: 480,
        }
        .apply(&mut w);
        WindowCommand::RequestClose.apply(&mut w);

        assert_eq!(w.title, "demo");
        assert_eq!((w.width, w.height), (640, 480));
        assert!(w.close_requested);
    }
}
