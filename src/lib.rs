//! X input-method integration for vendor-shell widget hierarchies.
//!
//! A vendor shell is the top-level window that owns an IM session on behalf
//! of the text widgets inside it. This crate implements the lifecycle glue
//! between those widgets and the platform input method: opening a method
//! under a list of candidate locale modifiers, negotiating a pre-edit/status
//! presentation style, creating and reconfiguring input contexts, sharing
//! one context between sibling widgets with copy-on-focus semantics, and
//! growing the shell to make room for on-screen pre-edit/status areas.
//!
//! The two things this crate deliberately does not do are talk to the
//! display server and own an event loop. The platform IM protocol sits
//! behind [`XimBackend`] and the widget framework behind [`Toolkit`]; the
//! host drives every operation from its own dispatch.
//!
//! All calls must happen on the shell's event-processing thread; nothing
//! here suspends or re-enters.
//!
//! Widgets that never get a working context (IM disabled, no method could
//! be opened, the method refuses the configured styles) silently fall back
//! to plain key lookup with single-byte widening — see
//! [`Ime::lookup_string`].

mod assoc;
mod attributes;
mod context;
mod geometry;
mod input_method;
mod lookup;
mod platform;
mod record;
mod shell;
mod style;
mod toolkit;

pub use crate::attributes::{AttrList, AttrName, AttrValue};
pub use crate::geometry::Rect;
pub use crate::platform::{
    AreaKind, Composed, ContextId, ContextLost, FontSetId, KeyEvent, Keysym, LookupStatus,
    MethodId, Pixel, PixmapId, RawLookup, WidgetId, WindowId, XimBackend,
};
pub use crate::record::{IcAttrs, WidgetAttr};
pub use crate::style::{ImeOptions, InputStyle};
pub use crate::toolkit::{Margins, StructureEvent, Toolkit};

use crate::assoc::AssocTable;
use crate::lookup::widen_fallback;
use crate::shell::ShellExt;

/// The process-wide IME registry.
///
/// Owns one extension state per vendor shell, plus the lookup tables that
/// associate a shell with its state and an open method handle with the
/// shell it belongs to (for fatal-error routing). Create one at application
/// startup and thread it through the widget framework's callbacks; its
/// lifetime should span all shells it manages.
///
/// Every operation is a no-op when its preconditions are not met — an
/// unregistered widget, a shell without IM support, a failed context. No
/// failure crosses this boundary, and no shell's failure affects another.
#[derive(Debug, Default)]
pub struct Ime {
    shells: AssocTable<WidgetId, ShellExt>,
    methods: AssocTable<MethodId, WidgetId>,
}

impl Ime {
    pub fn new() -> Self {
        Ime { shells: AssocTable::new(), methods: AssocTable::new() }
    }

    /// Attach IME extension state to a vendor shell. Call when the shell is
    /// created, before any widget on it registers.
    pub fn initialize_shell(&mut self, shell: WidgetId, options: ImeOptions) {
        self.shells.save(shell, ShellExt::new(shell, options));
    }

    /// Tear the shell's IME state down: destroy every context, close the
    /// method, release the association entries. Call from the shell's
    /// destroy hook.
    pub fn destroy_shell(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        shell: WidgetId,
    ) {
        let Some(mut ext) = self.shells.delete(&shell) else {
            return;
        };
        if let Some(closed) = ext.destroy_all(tk, xim) {
            self.methods.delete(&closed);
        }
    }

    /// The shell's window now exists: watch it for structure changes and
    /// create every pending context.
    pub fn realize_shell(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        shell: WidgetId,
    ) {
        if tk.window(shell).is_none() {
            return;
        }
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        tk.watch_structure(shell, true);
        ext.create_all(tk, xim);
    }

    /// Put a text widget under IM management.
    ///
    /// Opens the shell's input method if none is open yet; if the shell is
    /// already realized the widget's context is created and focused right
    /// away. Registration succeeds (in degraded mode) even when no method
    /// can be opened.
    pub fn register(&mut self, tk: &mut dyn Toolkit, xim: &mut dyn XimBackend, widget: WidgetId) {
        let Some(shell) = tk.vendor_shell(widget) else {
            return;
        };
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        if let Some(opened) = ext.register(tk, xim, widget) {
            self.methods.save(opened, shell);
        }
    }

    /// Remove a widget from IM management, destroying its context. When the
    /// last widget leaves, the method is closed and the reserved shell
    /// height released.
    pub fn unregister(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        let Some(shell) = tk.vendor_shell(widget) else {
            return;
        };
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        if let Some(closed) = ext.unregister(tk, xim, widget) {
            self.methods.delete(&closed);
        }
    }

    /// Apply named attribute values to a widget. Changes are recorded in
    /// the widget's dirty set and pushed to its context as one batch.
    pub fn set_values(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
        args: &[WidgetAttr],
    ) {
        self.set_values_inner(tk, xim, widget, args, false);
    }

    /// [`set_values`](Self::set_values), plus a request for the widget to
    /// take the context's input focus.
    pub fn set_focus_values(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
        args: &[WidgetAttr],
    ) {
        self.set_values_inner(tk, xim, widget, args, true);
    }

    fn set_values_inner(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
        args: &[WidgetAttr],
        focus: bool,
    ) {
        let Some(shell) = tk.vendor_shell(widget) else {
            return;
        };
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };

        if !args.is_empty() {
            ext.set_widget_values(widget, args);
        }
        if focus {
            ext.ic.mark_focus_pending(widget);
        }
        if tk.window(shell).is_none() || ext.session.method.is_none() {
            return;
        }
        if ext.has_live_context(widget) {
            ext.apply_values(tk, xim, widget, false);
            if focus {
                ext.set_ic_focus(tk, xim, widget);
            }
        } else {
            ext.create_context(tk, xim, widget);
            ext.set_ic_focus(tk, xim, widget);
        }
    }

    /// Relinquish the widget's claim on context focus, pending or held.
    pub fn unset_focus(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        let Some(shell) = tk.vendor_shell(widget) else {
            return;
        };
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        let realized = tk.window(shell).is_some();
        let Some(record) = ext.ic.resolve_mut(widget) else {
            return;
        };
        record.dirty.remove(IcAttrs::FOCUS);
        record.ever_set.remove(IcAttrs::FOCUS);
        let live = record.context.is_some();
        if ext.session.method.is_some() && realized && live {
            ext.unset_ic_focus(xim, widget);
        }
    }

    /// Recovery path: re-enable IM use for the widget's shell, reopen the
    /// method if needed, clear sticky failures and recreate every context
    /// from the recorded ever-set attribute values.
    pub fn reconnect(&mut self, tk: &mut dyn Toolkit, xim: &mut dyn XimBackend, widget: WidgetId) {
        let Some(shell) = tk.vendor_shell(widget) else {
            return;
        };
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        if let Some(opened) = ext.reconnect(tk, xim) {
            self.methods.save(opened, shell);
        }
    }

    /// Structure-change notification from the toolkit. Shell configures
    /// re-anchor the on-screen decoration areas; watched widget configures
    /// re-push the position-style pre-edit rectangle. Everything else is
    /// ignored.
    pub fn structure_notify(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        event: &StructureEvent,
    ) {
        let StructureEvent::Configure { widget } = *event else {
            return;
        };
        if self.shells.contains(&widget) {
            self.resize_notify(tk, xim, widget);
            return;
        }
        let Some(shell) = tk.vendor_shell(widget) else {
            return;
        };
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        ext.widget_configured(tk, xim, widget);
    }

    /// Reposition the shell's status/pre-edit areas after a shell resize.
    pub fn resize_notify(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        shell: WidgetId,
    ) {
        let Some(ext) = self.shells.find_mut(&shell) else {
            return;
        };
        ext.resize_areas(tk, xim);
    }

    /// The shell height currently reserved for IM decoration, looked up
    /// from any widget on the shell.
    pub fn reserved_height(&self, tk: &dyn Toolkit, widget: WidgetId) -> u16 {
        tk.vendor_shell(widget)
            .and_then(|shell| self.shells.find(&shell))
            .map_or(0, |ext| ext.session.reserved_height)
    }

    /// The shell's height minus the decoration reservation — what layout
    /// should treat as the usable content height.
    pub fn content_height(&self, tk: &dyn Toolkit, shell: WidgetId) -> u16 {
        match self.shells.find(&shell) {
            Some(ext) => ext.content_height(tk),
            None => tk.size(shell).height,
        }
    }

    /// Decode a key press for the widget: through its live context when it
    /// has one, otherwise through the plain fallback lookup with byte-wise
    /// Latin-1 widening.
    pub fn lookup_string(
        &self,
        tk: &dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
        event: &KeyEvent,
    ) -> Composed {
        if let Some(ext) = tk.vendor_shell(widget).and_then(|shell| self.shells.find(&shell)) {
            if ext.session.method.is_some() {
                if let Some(context) = ext.ic.resolve(widget).and_then(|record| record.context) {
                    return xim.lookup(context, event);
                }
            }
        }
        widen_fallback(xim.lookup_fallback(event))
    }

    /// A fatal method-level error was reported: tear down every context and
    /// the method itself for the owning shell. Other shells are unaffected;
    /// a later [`reconnect`](Self::reconnect) may bring the shell back.
    pub fn method_error(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        method: MethodId,
    ) {
        let Some(&shell) = self.methods.find(&method) else {
            return;
        };
        if let Some(ext) = self.shells.find_mut(&shell) {
            ext.destroy_all(tk, xim);
        }
        self.methods.delete(&method);
    }
}
