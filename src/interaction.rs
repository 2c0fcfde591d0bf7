//! Drag and resize gestures on the design surface.
//!
//! The controller owns the [`TextBox`] being designed and a single gesture
//! slot. Mouse and touch adapters both turn their events into a
//! [`PointerSample`] in client coordinates; all math goes through
//! [`crate::geometry`], so the two sources differ only in how they read the
//! initiating event.
//!
//! ```text
//!            down on body               move: reposition
//!   Idle ─────────────────▶ Dragging ──────────────┐
//!    ▲  ◀─────────────────     │    ◀──────────────┘
//!    │    up / cancel          │
//!    │                         │ (mutually exclusive)
//!    │   down on handle        │
//!    └──────────────────▶ Resizing(corner) ◀── move: incremental delta
//!        ◀──────────────
//!          up / cancel
//! ```
//!
//! While a gesture is active the host's process-wide move/up listeners are
//! attached through a [`ListenerGuard`]. The guard lives inside the gesture
//! state, so leaving the state for any reason (up, cancel, forced release,
//! dropping the controller) detaches them.

use crate::geometry::{
    Corner, Dimensions, Point, Rect, TextBox, clamp_to_bounds, design_to_preview, move_clamped,
    preview_to_design, resize_from_corner,
};
use std::rc::Rc;
use tracing::debug;

/// Radius of a corner handle, in preview pixels.
pub const HANDLE_RADIUS: f64 = 8.0;

/// Host hook for the global move/up listeners.
///
/// `attach` is called when a gesture starts and `detach` exactly once when it
/// ends. Implementations usually register capture-phase listeners on the
/// document or window.
pub trait GlobalListeners {
    fn attach(&self);
    fn detach(&self);
}

/// Listeners for hosts that deliver every event to the controller anyway.
#[derive(Debug, Default)]
pub struct NoopListeners;

impl GlobalListeners for NoopListeners {
    fn attach(&self) {}
    fn detach(&self) {}
}

/// Keeps the global listeners attached for as long as it lives.
pub struct ListenerGuard {
    listeners: Rc<dyn GlobalListeners>,
}

impl ListenerGuard {
    fn acquire(listeners: &Rc<dyn GlobalListeners>) -> Self {
        listeners.attach();
        Self {
            listeners: Rc::clone(listeners),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.listeners.detach();
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ListenerGuard")
    }
}

// ============================================================================
// Pointer input
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Mouse,
    Touch,
}

/// Identity of the pointer that owns a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId {
    pub source: InputSource,
    pub id: u64,
}

impl PointerId {
    pub const MOUSE: PointerId = PointerId {
        source: InputSource::Mouse,
        id: 0,
    };

    pub const fn touch(id: u64) -> Self {
        Self {
            source: InputSource::Touch,
            id,
        }
    }
}

/// One entry of a touch list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub identifier: u64,
    pub client_x: f64,
    pub client_y: f64,
}

/// A pointer position in client coordinates, tagged with its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer: PointerId,
    pub position: Point,
}

impl PointerSample {
    pub fn mouse(client_x: f64, client_y: f64) -> Self {
        Self {
            pointer: PointerId::MOUSE,
            position: Point::new(client_x, client_y),
        }
    }

    /// First touch of the list; `None` for an empty list.
    pub fn from_touches(touches: &[TouchPoint]) -> Option<Self> {
        touches.first().map(|t| Self {
            pointer: PointerId::touch(t.identifier),
            position: Point::new(t.client_x, t.client_y),
        })
    }
}

// ============================================================================
// Surface and hit testing
// ============================================================================

/// The design surface: sample image size plus where it is drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub design: Dimensions,
    /// On-screen image box in client coordinates.
    pub preview: Rect,
}

impl Surface {
    pub fn to_design(&self, client: Point) -> Point {
        preview_to_design(client, self.design, self.preview)
    }

    pub fn to_preview(&self, rect: Rect) -> Rect {
        design_to_preview(rect, self.design, self.preview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    Handle(Corner),
}

/// What a client-space point lands on. Handles win over the body, and a
/// handle reaches [`HANDLE_RADIUS`] outside the box.
pub fn hit_test(point: Point, text_box: &TextBox, surface: &Surface) -> Option<HitTarget> {
    let on_screen = surface.to_preview(text_box.rect());
    let handle = Corner::ALL.into_iter().find(|corner| {
        let c = corner.of(&on_screen);
        (point.x - c.x).hypot(point.y - c.y) <= HANDLE_RADIUS
    });
    match handle {
        Some(corner) => Some(HitTarget::Handle(corner)),
        None if on_screen.contains(point) => Some(HitTarget::Body),
        None => None,
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Externally visible gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Dragging,
    Resizing(Corner),
}

#[derive(Debug)]
enum Gesture {
    Idle,
    Dragging {
        pointer: PointerId,
        /// Pointer position relative to the box's top-left, design space.
        offset: Point,
        _guard: ListenerGuard,
    },
    Resizing {
        pointer: PointerId,
        corner: Corner,
        /// Previous pointer position, design space.
        last: Point,
        _guard: ListenerGuard,
    },
}

pub struct InteractionController {
    text_box: TextBox,
    surface: Surface,
    listeners: Rc<dyn GlobalListeners>,
    gesture: Gesture,
}

impl InteractionController {
    /// The box is clamped into the surface's design bounds.
    pub fn new(text_box: TextBox, surface: Surface, listeners: Rc<dyn GlobalListeners>) -> Self {
        Self {
            text_box: clamp_to_bounds(&text_box, surface.design),
            surface,
            listeners,
            gesture: Gesture::Idle,
        }
    }

    pub fn text_box(&self) -> &TextBox {
        &self.text_box
    }

    /// Edit text or style. Geometry edits are re-clamped.
    pub fn update_text_box(&mut self, f: impl FnOnce(&mut TextBox)) {
        f(&mut self.text_box);
        self.text_box = clamp_to_bounds(&self.text_box, self.surface.design);
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The preview was laid out again (window resize, zoom). Design-space
    /// state is unaffected.
    pub fn set_preview(&mut self, preview: Rect) {
        self.surface.preview = preview;
    }

    pub fn state(&self) -> GestureState {
        match self.gesture {
            Gesture::Idle => GestureState::Idle,
            Gesture::Dragging { .. } => GestureState::Dragging,
            Gesture::Resizing { corner, .. } => GestureState::Resizing(corner),
        }
    }

    /// Start a gesture if the sample hits the box. Returns whether a gesture
    /// started; downs during an active gesture are ignored.
    pub fn pointer_down(&mut self, sample: PointerSample) -> bool {
        if !matches!(self.gesture, Gesture::Idle) {
            return false;
        }
        let Some(target) = hit_test(sample.position, &self.text_box, &self.surface) else {
            return false;
        };
        let at = self.surface.to_design(sample.position);
        self.gesture = match target {
            HitTarget::Body => Gesture::Dragging {
                pointer: sample.pointer,
                offset: at.offset_from(self.text_box.rect().origin()),
                _guard: ListenerGuard::acquire(&self.listeners),
            },
            HitTarget::Handle(corner) => Gesture::Resizing {
                pointer: sample.pointer,
                corner,
                last: at,
                _guard: ListenerGuard::acquire(&self.listeners),
            },
        };
        debug!(?target, "gesture started");
        true
    }

    /// Apply a move from the pointer that owns the gesture.
    pub fn pointer_move(&mut self, sample: PointerSample) {
        let at = self.surface.to_design(sample.position);
        let bounds = self.surface.design;
        match &mut self.gesture {
            Gesture::Dragging {
                pointer, offset, ..
            } if *pointer == sample.pointer => {
                let top_left = at.offset_from(*offset);
                let rect = move_clamped(self.text_box.rect(), top_left, bounds);
                self.text_box.set_rect(rect);
            }
            Gesture::Resizing {
                pointer,
                corner,
                last,
                ..
            } if *pointer == sample.pointer => {
                let delta = at.offset_from(*last);
                *last = at;
                let rect = resize_from_corner(self.text_box.rect(), *corner, delta, bounds);
                self.text_box.set_rect(rect);
            }
            _ => {}
        }
    }

    /// End the gesture if `pointer` owns it. Position is irrelevant: the
    /// release may happen anywhere on screen.
    pub fn pointer_up(&mut self, pointer: PointerId) {
        if self.owner() == Some(pointer) {
            self.release();
        }
    }

    /// Touch end: the touch list no longer contains the owning touch.
    pub fn touches_changed(&mut self, remaining: &[TouchPoint]) {
        let Some(owner) = self.owner() else {
            return;
        };
        let lifted = !remaining
            .iter()
            .any(|t| PointerId::touch(t.identifier) == owner);
        if owner.source == InputSource::Touch && lifted {
            self.release();
        }
    }

    /// Pointer lost (cancel, blur, capture loss). Ends any gesture.
    pub fn pointer_cancel(&mut self) {
        self.release();
    }

    fn owner(&self) -> Option<PointerId> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging { pointer, .. } | Gesture::Resizing { pointer, .. } => Some(pointer),
        }
    }

    fn release(&mut self) {
        if !matches!(self.gesture, Gesture::Idle) {
            debug!("gesture ended");
        }
        // Dropping the previous state drops its guard.
        self.gesture = Gesture::Idle;
    }

    pub fn into_text_box(self) -> TextBox {
        self.text_box
    }
}
