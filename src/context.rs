//! Input-context lifecycle: creation, deferred attribute sync, area
//! negotiation, focus hand-off and destruction.

use dpi::PhysicalPosition;

use crate::attributes::{AttrList, AttrName, AttrValue};
use crate::geometry::{content_rect, Rect};
use crate::platform::{AreaKind, WidgetId, XimBackend};
use crate::record::{IcAttrs, IcRecord};
use crate::shell::ShellExt;
use crate::style::InputStyle;
use crate::toolkit::Toolkit;

/// Append the dirty appearance attributes to both nested lists. Every one
/// of them applies to the pre-edit and the status component alike.
fn push_appearance(snapshot: &IcRecord, preedit: &mut AttrList, status: &mut AttrList) {
    if snapshot.dirty.contains(IcAttrs::FONT_SET) {
        if let Some(font_set) = snapshot.font_set {
            preedit.push(AttrName::FontSet, AttrValue::FontSet(font_set));
            status.push(AttrName::FontSet, AttrValue::FontSet(font_set));
        }
    }
    if snapshot.dirty.contains(IcAttrs::FOREGROUND) {
        if let Some(pixel) = snapshot.foreground {
            preedit.push(AttrName::Foreground, AttrValue::Pixel(pixel));
            status.push(AttrName::Foreground, AttrValue::Pixel(pixel));
        }
    }
    if snapshot.dirty.contains(IcAttrs::BACKGROUND) {
        if let Some(pixel) = snapshot.background {
            preedit.push(AttrName::Background, AttrValue::Pixel(pixel));
            status.push(AttrName::Background, AttrValue::Pixel(pixel));
        }
    }
    if snapshot.dirty.contains(IcAttrs::BACKGROUND_PIXMAP) {
        if let Some(pixmap) = snapshot.bg_pixmap {
            preedit.push(AttrName::BackgroundPixmap, AttrValue::Pixmap(pixmap));
            status.push(AttrName::BackgroundPixmap, AttrValue::Pixmap(pixmap));
        }
    }
    if snapshot.dirty.contains(IcAttrs::LINE_SPACING) {
        if let Some(spacing) = snapshot.line_spacing {
            preedit.push(AttrName::LineSpace, AttrValue::Spacing(spacing));
            status.push(AttrName::LineSpace, AttrValue::Spacing(spacing));
        }
    }
}

impl ShellExt {
    /// Create the widget's input context.
    ///
    /// No-op while the widget is unrealized, no method is open, the widget
    /// is unregistered, a live context already exists, or a previous
    /// attempt failed (sticky until reconnect).
    pub(crate) fn create_context(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        if tk.window(widget).is_none() {
            return;
        }
        let Some(method) = self.session.method else {
            return;
        };
        let Some(shell_window) = tk.window(self.shell) else {
            return;
        };
        match self.ic.resolve(widget) {
            Some(record) if record.context.is_none() && !record.failed => {},
            _ => return,
        }

        let style = self.session.input_style;
        if let Some(record) = self.ic.resolve_mut(widget) {
            record.style = style;
        }
        if self.ic.is_shared() {
            self.ic.propagate_shared(widget, false);
        }
        let Some(snapshot) = self.ic.resolve(widget).cloned() else {
            return;
        };

        let mut preedit = AttrList::new();
        let mut status = AttrList::new();
        let mut decoration_height = 0;

        if style.uses_client_area() {
            push_appearance(&snapshot, &mut preedit, &mut status);
            if snapshot.dirty.contains(IcAttrs::FONT_SET) {
                if let Some(font_set) = snapshot.font_set {
                    let font_height = tk.font_height(font_set);
                    decoration_height = self.reserve_height(tk, font_height);
                }
            }
        }
        if style.contains(InputStyle::PREEDIT_AREA) {
            let band = Rect::bottom_band(tk.size(self.shell), decoration_height);
            preedit.push(AttrName::Area, AttrValue::Area(band));
        }
        if style.contains(InputStyle::PREEDIT_POSITION) {
            let rect = content_rect(tk.size(widget), &tk.text_margins(widget));
            preedit.push(AttrName::Area, AttrValue::Area(rect));
            let spot = if snapshot.dirty.contains(IcAttrs::CURSOR_POSITION) {
                tk.caret_position(widget, snapshot.cursor_position.unwrap_or(0))
            } else {
                PhysicalPosition::new(0, 0)
            };
            preedit.push(AttrName::SpotLocation, AttrValue::Spot(spot));
        }
        if style.contains(InputStyle::STATUS_AREA) {
            let band = Rect::bottom_band(tk.size(self.shell), decoration_height);
            status.push(AttrName::Area, AttrValue::Area(band));
        }

        let mut attrs = AttrList::new();
        attrs.push(AttrName::InputStyle, AttrValue::Style(style));
        attrs.push(AttrName::ClientWindow, AttrValue::Window(shell_window));
        if let Some(window) = tk.window(widget) {
            attrs.push(AttrName::FocusWindow, AttrValue::Window(window));
        }
        attrs.push_nested(AttrName::PreeditAttributes, preedit);
        attrs.push_nested(AttrName::StatusAttributes, status);

        let Some(context) = xim.create_context(method, attrs) else {
            if let Some(record) = self.ic.resolve_mut(widget) {
                record.failed = true;
            }
            return;
        };
        if let Some(record) = self.ic.resolve_mut(widget) {
            record.context = Some(context);
        }

        self.negotiate_area_size(tk, xim, widget);

        if let Some(record) = self.ic.resolve_mut(widget) {
            record.clear_value_dirt();
        }
        if !self.ic.is_shared() && style.contains(InputStyle::PREEDIT_POSITION) {
            tk.watch_structure(widget, true);
        }
    }

    /// Ask the context how much room its on-screen components need and push
    /// back the final status/pre-edit rectangles as one batch: the status
    /// area sits at the shell bottom, the pre-edit area takes the width the
    /// status area leaves over.
    pub(crate) fn negotiate_area_size(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        let Some(record) = self.ic.resolve(widget) else {
            return;
        };
        let Some(context) = record.context else {
            return;
        };
        let style = record.style;
        if !style.intersects(InputStyle::PREEDIT_AREA | InputStyle::STATUS_AREA) {
            return;
        }
        let shell_size = tk.size(self.shell);

        let preedit_needed = if style.contains(InputStyle::PREEDIT_AREA) {
            match xim.context_area_needed(context, AreaKind::Preedit) {
                Ok(area) => Some(area),
                Err(_) => {
                    self.mark_record_failed(widget);
                    return;
                },
            }
        } else {
            None
        };
        let status_needed = if style.contains(InputStyle::STATUS_AREA) {
            match xim.context_area_needed(context, AreaKind::Status) {
                Ok(area) => Some(area),
                Err(_) => {
                    self.mark_record_failed(widget);
                    return;
                },
            }
        } else {
            None
        };

        let mut batch = AttrList::new();
        let mut status_width = 0;
        if let Some(needed) = status_needed {
            status_width = if preedit_needed.is_some() { needed.width } else { shell_size.width };
            let area = Rect::new(
                0,
                shell_size.height.saturating_sub(needed.height) as i16,
                status_width,
                needed.height,
            );
            let mut status = AttrList::new();
            status.push(AttrName::Area, AttrValue::Area(area));
            batch.push_nested(AttrName::StatusAttributes, status);
        }
        if let Some(needed) = preedit_needed {
            let area = Rect::new(
                status_width as i16,
                shell_size.height.saturating_sub(needed.height) as i16,
                shell_size.width.saturating_sub(status_width),
                needed.height,
            );
            let mut preedit = AttrList::new();
            preedit.push(AttrName::Area, AttrValue::Area(area));
            batch.push_nested(AttrName::PreeditAttributes, preedit);
        }

        if xim.set_context_values(context, batch).is_err() {
            self.mark_record_failed(widget);
        }
    }

    /// Push the widget's deferred attribute changes to its live context as
    /// a single batch. `focus_change` additionally re-points the context's
    /// focus window at the widget.
    pub(crate) fn apply_values(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
        focus_change: bool,
    ) {
        if self.session.method.is_none() {
            return;
        }
        match self.ic.resolve(widget) {
            Some(record) if record.context.is_some() => {},
            _ => return,
        }

        if self.ic.is_shared() {
            self.ic.propagate_shared(widget, true);
        }
        let Some(snapshot) = self.ic.resolve(widget).cloned() else {
            return;
        };
        let Some(context) = snapshot.context else {
            return;
        };
        let style = snapshot.style;
        if !focus_change && (snapshot.dirty & IcAttrs::VALUES).is_empty() {
            return;
        }

        let mut preedit = AttrList::new();
        let mut status = AttrList::new();
        if style.uses_client_area() {
            push_appearance(&snapshot, &mut preedit, &mut status);
            if snapshot.dirty.contains(IcAttrs::FONT_SET) {
                if let Some(font_set) = snapshot.font_set {
                    let font_height = tk.font_height(font_set);
                    self.reserve_height(tk, font_height);
                }
            }
        }
        if style.contains(InputStyle::PREEDIT_POSITION)
            && snapshot.dirty.contains(IcAttrs::CURSOR_POSITION)
        {
            let spot = tk.caret_position(widget, snapshot.cursor_position.unwrap_or(0));
            preedit.push(AttrName::SpotLocation, AttrValue::Spot(spot));
        }
        // Shared position-style contexts resync the whole content rectangle
        // on every apply; the widget behind the context may have changed.
        if self.ic.is_shared() && style.contains(InputStyle::PREEDIT_POSITION) {
            let rect = content_rect(tk.size(widget), &tk.text_margins(widget));
            preedit.push(AttrName::Area, AttrValue::Area(rect));
        }

        let mut attrs = AttrList::new();
        attrs.push_nested(AttrName::PreeditAttributes, preedit);
        attrs.push_nested(AttrName::StatusAttributes, status);
        if focus_change {
            if let Some(window) = tk.window(widget) {
                attrs.push(AttrName::FocusWindow, AttrValue::Window(window));
            }
        }

        if !attrs.is_empty() && xim.set_context_values(context, attrs).is_err() {
            self.mark_record_failed(widget);
            return;
        }

        if self.ic.is_shared() && snapshot.dirty.contains(IcAttrs::FONT_SET) {
            self.negotiate_area_size(tk, xim, widget);
        }
        if let Some(record) = self.ic.resolve_mut(widget) {
            record.clear_value_dirt();
        }
    }

    /// Give the widget the context's input focus.
    ///
    /// In shared mode a hand-off first re-points the context: the new
    /// widget becomes current and its pending attributes are pushed in the
    /// same batch that moves the focus window.
    pub(crate) fn set_ic_focus(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        if self.session.method.is_none() {
            return;
        }
        match self.ic.resolve(widget) {
            Some(record) if record.context.is_some() => {},
            _ => return,
        }

        if self.ic.is_shared() && self.ic.current_widget() != Some(widget) {
            self.ic.set_current(Some(widget));
            self.apply_values(tk, xim, widget, true);
        }

        let Some(record) = self.ic.resolve_mut(widget) else {
            return;
        };
        if record.dirty.contains(IcAttrs::FOCUS) && !record.focused {
            if let Some(context) = record.context {
                record.focused = true;
                xim.focus_context(context);
            }
        }
        record.dirty.remove(IcAttrs::FOCUS);
    }

    /// Drop the context's input focus on behalf of the widget. In shared
    /// mode only the current widget may do so, and doing so clears the
    /// current mark.
    pub(crate) fn unset_ic_focus(&mut self, xim: &mut dyn XimBackend, widget: WidgetId) {
        if self.session.method.is_none() {
            return;
        }
        match self.ic.resolve(widget) {
            Some(record) if record.context.is_some() => {},
            _ => return,
        }

        if self.ic.is_shared() {
            if let Some(current) = self.ic.current_widget() {
                if current != widget {
                    return;
                }
                self.ic.set_current(None);
            }
        }

        let Some(record) = self.ic.resolve_mut(widget) else {
            return;
        };
        if record.focused {
            record.focused = false;
            if let Some(context) = record.context {
                xim.unfocus_context(context);
            }
        }
    }

    /// Destroy the widget's view of its context. Per-widget contexts are
    /// destroyed for real; a shared context only loses focus if this widget
    /// holds it, the handle itself stays with the session.
    pub(crate) fn destroy_context(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        if self.session.method.is_none() {
            return;
        }
        let (context, style) = match self.ic.resolve(widget) {
            Some(record) => match record.context {
                Some(context) => (context, record.style),
                None => return,
            },
            None => return,
        };

        if self.ic.is_shared() {
            if self.ic.current_widget() == Some(widget) {
                self.unset_ic_focus(xim, widget);
            }
            return;
        }

        xim.destroy_context(context);
        if let Some(record) = self.ic.resolve_mut(widget) {
            record.context = None;
        }
        if style.contains(InputStyle::PREEDIT_POSITION) {
            tk.watch_structure(widget, false);
        }
    }

    /// A watched widget was reconfigured: re-push the position-style
    /// pre-edit rectangle. Shared contexts refresh lazily on the next
    /// apply/focus call instead.
    pub(crate) fn widget_configured(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) {
        if self.ic.is_shared() || self.session.method.is_none() {
            return;
        }
        let (context, style) = match self.ic.resolve(widget) {
            Some(record) => match record.context {
                Some(context) => (context, record.style),
                None => return,
            },
            None => return,
        };
        if !style.contains(InputStyle::PREEDIT_POSITION) {
            return;
        }

        let rect = content_rect(tk.size(widget), &tk.text_margins(widget));
        let mut preedit = AttrList::new();
        preedit.push(AttrName::Area, AttrValue::Area(rect));
        let mut batch = AttrList::new();
        batch.push_nested(AttrName::PreeditAttributes, preedit);
        if xim.set_context_values(context, batch).is_err() {
            self.mark_record_failed(widget);
        }
    }
}
