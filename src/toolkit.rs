//! The windowing/widget capability this subsystem is hosted by.

use dpi::{PhysicalPosition, PhysicalSize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::platform::{FontSetId, WidgetId, WindowId};

/// Text-widget margin geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Margins {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
}

/// What the widget framework exposes to the IME subsystem.
///
/// Event dispatch, window creation and geometry management stay with the
/// toolkit; this trait only answers questions about widgets and applies the
/// one geometry change the subsystem makes (shell height).
pub trait Toolkit {
    /// Walk from a widget up to the vendor shell that hosts it, if any.
    fn vendor_shell(&self, widget: WidgetId) -> Option<WidgetId>;

    /// The widget's window. `None` until the widget is realized.
    fn window(&self, widget: WidgetId) -> Option<WindowId>;

    /// The widget's current width and height.
    fn size(&self, widget: WidgetId) -> PhysicalSize<u16>;

    /// Resize a shell to the given total height.
    fn set_height(&mut self, widget: WidgetId, height: u16);

    /// The text widget's margin geometry.
    fn text_margins(&self, widget: WidgetId) -> Margins;

    /// Map a text-insertion offset to a pixel position inside the widget.
    fn caret_position(&self, widget: WidgetId, index: u32) -> PhysicalPosition<i16>;

    /// Max ascent plus max descent of a font set, i.e. the height one line
    /// of pre-edit or status text needs.
    fn font_height(&self, font_set: FontSetId) -> u16;

    /// Subscribe to or unsubscribe from structure-change notifications for
    /// a widget. Delivered back through [`Ime::structure_notify`].
    ///
    /// [`Ime::structure_notify`]: crate::Ime::structure_notify
    fn watch_structure(&mut self, widget: WidgetId, watch: bool);
}

/// A structure-change notification forwarded from the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StructureEvent {
    /// The widget's size or position changed.
    Configure { widget: WidgetId },
    Map { widget: WidgetId },
    Unmap { widget: WidgetId },
}
