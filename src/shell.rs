//! Per-shell extension state: the IM session and its widget records.

use dpi::PhysicalSize;

use crate::attributes::{AttrList, AttrName, AttrValue};
use crate::geometry::Rect;
use crate::input_method::{negotiate_style, PotentialModifiers};
use crate::platform::{AreaKind, MethodId, WidgetId, XimBackend};
use crate::record::{IcStore, WidgetAttr};
use crate::style::{ImeOptions, InputStyle};
use crate::toolkit::Toolkit;

/// The shell's connection to the platform input method.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) enabled: bool,
    pub(crate) method: Option<MethodId>,
    pub(crate) input_method: Option<String>,
    pub(crate) preedit_type: String,
    pub(crate) input_style: InputStyle,
    /// Extra shell height reserved for pre-edit/status decoration.
    pub(crate) reserved_height: u16,
}

/// Everything the IME subsystem keeps for one vendor shell.
#[derive(Debug)]
pub(crate) struct ShellExt {
    pub(crate) shell: WidgetId,
    pub(crate) session: Session,
    pub(crate) ic: IcStore,
}

impl ShellExt {
    pub(crate) fn new(shell: WidgetId, options: ImeOptions) -> Self {
        ShellExt {
            shell,
            session: Session {
                enabled: options.enable,
                method: None,
                input_method: options.input_method,
                preedit_type: options.preedit_type,
                input_style: InputStyle::empty(),
                reserved_height: 0,
            },
            ic: IcStore::new(options.shared_context, shell),
        }
    }

    /// Open an input method for this shell, negotiating the input style.
    ///
    /// Returns the newly opened method handle so the caller can register it
    /// for error routing. Leaves the session untouched (degraded mode) when
    /// no modifier opens a method or no preference style is supported.
    pub(crate) fn open_input_method(&mut self, xim: &mut dyn XimBackend) -> Option<MethodId> {
        if !self.session.enabled {
            return None;
        }

        let mut potential = PotentialModifiers::new(self.session.input_method.as_deref());
        let Some(method) = potential.open(xim) else {
            tracing::warn!("input method open failed ({:?})", potential);
            return None;
        };

        let supported = xim.supported_styles(method);
        if supported.is_empty() {
            tracing::warn!("input method does not support any style");
            xim.close_method(method);
            return None;
        }

        match negotiate_style(&self.session.preedit_type, &supported) {
            Some(style) => {
                tracing::debug!("opened input method with style {:?}", style);
                self.session.input_style = style;
                self.session.method = Some(method);
                Some(method)
            },
            None => {
                tracing::warn!(
                    "input method supports none of the configured styles {:?}",
                    self.session.preedit_type
                );
                xim.close_method(method);
                None
            },
        }
    }

    /// Close the method if open; idempotent. Returns the closed handle.
    pub(crate) fn close_input_method(&mut self, xim: &mut dyn XimBackend) -> Option<MethodId> {
        let method = self.session.method.take();
        if let Some(method) = method {
            xim.close_method(method);
        }
        method
    }

    /// Grow the decoration-height reservation, or release it entirely.
    ///
    /// The reservation only ever grows, except that a request of zero
    /// shrinks it back to nothing; either way the shell's real height is
    /// adjusted by the delta. Returns the resulting reservation.
    pub(crate) fn reserve_height(&mut self, tk: &mut dyn Toolkit, height: u16) -> u16 {
        if self.session.reserved_height < height || height == 0 {
            let shell_height = tk.size(self.shell).height as i32;
            let adjusted =
                shell_height + height as i32 - self.session.reserved_height as i32;
            tk.set_height(self.shell, adjusted.max(0) as u16);
            self.session.reserved_height = height;
        }
        self.session.reserved_height
    }

    pub(crate) fn content_height(&self, tk: &dyn Toolkit) -> u16 {
        tk.size(self.shell)
            .height
            .saturating_sub(self.session.reserved_height)
    }

    /// Widget enters IM-managed state. Retries opening the method whenever
    /// none is open yet; registration itself succeeds even without one.
    pub(crate) fn register(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) -> Option<MethodId> {
        let mut opened = None;
        if self.session.method.is_none() {
            opened = self.open_input_method(xim);
        }

        if self.ic.is_registered(widget) {
            return opened;
        }
        self.ic.register(widget);

        if self.session.method.is_none() {
            return opened;
        }
        if tk.window(self.shell).is_some() {
            self.create_context(tk, xim, widget);
            self.set_ic_focus(tk, xim, widget);
        }
        opened
    }

    /// Widget leaves IM-managed state. Closing the last registration also
    /// closes the method and releases the reserved height. Returns the
    /// closed method handle, if any.
    pub(crate) fn unregister(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
    ) -> Option<MethodId> {
        if !self.ic.is_registered(widget) {
            return None;
        }

        self.destroy_context(tk, xim, widget);
        self.ic.unregister(widget);

        if !self.ic.is_empty() {
            return None;
        }

        // The shared context must not outlive the method it was created on.
        if let Some(shared) = self.ic.shared_mut() {
            if let Some(context) = shared.record.context.take() {
                xim.destroy_context(context);
            }
            shared.record.focused = false;
            shared.current = None;
        }
        let closed = self.close_input_method(xim);
        self.reserve_height(tk, 0);
        closed
    }

    /// Create contexts for everything registered, then hand out focus.
    /// Called at shell realize time and after a reconnect.
    pub(crate) fn create_all(&mut self, tk: &mut dyn Toolkit, xim: &mut dyn XimBackend) {
        if self.session.method.is_none() {
            return;
        }

        if self.ic.is_shared() {
            let Some(first) = self.ic.first_widget() else {
                return;
            };
            if self.ic.resolve(first).is_some_and(|r| r.context.is_none()) {
                self.create_context(tk, xim, first);
            }
            self.set_ic_focus(tk, xim, first);
            return;
        }

        for widget in self.ic.widgets() {
            if self.ic.resolve(widget).is_some_and(|r| r.context.is_none()) {
                self.create_context(tk, xim, widget);
            }
        }
        for widget in self.ic.widgets() {
            self.set_ic_focus(tk, xim, widget);
        }
    }

    /// Re-enable IM use, reopen if needed, replay every record's ever-set
    /// attributes onto freshly created contexts and restore focus.
    pub(crate) fn reconnect(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
    ) -> Option<MethodId> {
        self.session.enabled = true;
        let mut opened = None;
        if self.session.method.is_none() {
            opened = self.open_input_method(xim);
        }
        if self.session.method.is_none() {
            return opened;
        }

        self.ic.reset_for_reconnect();
        self.create_all(tk, xim);
        opened
    }

    /// Destroy every context and close the method: shell teardown and
    /// fatal-error recovery. Returns the closed method handle.
    pub(crate) fn destroy_all(
        &mut self,
        tk: &mut dyn Toolkit,
        xim: &mut dyn XimBackend,
    ) -> Option<MethodId> {
        if self.ic.is_shared() {
            if let Some(current) = self.ic.current_widget() {
                self.unset_ic_focus(xim, current);
            }
            if let Some(shared) = self.ic.shared_mut() {
                if let Some(context) = shared.record.context.take() {
                    xim.destroy_context(context);
                }
                shared.record.focused = false;
                shared.current = None;
            }
        } else {
            for widget in self.ic.widgets() {
                if self.ic.resolve(widget).is_some_and(|r| r.context.is_some()) {
                    self.destroy_context(tk, xim, widget);
                }
                if let Some(record) = self.ic.resolve_mut(widget) {
                    record.focused = false;
                }
            }
        }

        if self.session.method.is_none() {
            return None;
        }
        let closed = self.close_input_method(xim);
        self.reserve_height(tk, 0);
        closed
    }

    /// Apply named attribute values to the widget's own record.
    pub(crate) fn set_widget_values(&mut self, widget: WidgetId, args: &[WidgetAttr]) {
        if let Some(record) = self.ic.record_of_mut(widget) {
            record.apply(args);
        }
    }

    pub(crate) fn has_live_context(&self, widget: WidgetId) -> bool {
        self.session.method.is_some()
            && self.ic.resolve(widget).is_some_and(|r| r.context.is_some())
    }

    /// Re-anchor the on-screen status/pre-edit bands after a shell resize,
    /// keeping each area's current extent.
    pub(crate) fn resize_areas(&mut self, tk: &mut dyn Toolkit, xim: &mut dyn XimBackend) {
        if self.session.method.is_none() {
            return;
        }
        let shell_size = tk.size(self.shell);

        if self.ic.is_shared() {
            let Some(first) = self.ic.first_widget() else {
                return;
            };
            if self.ic.resolve(first).is_some_and(|r| r.context.is_some()) {
                self.refresh_band_areas(xim, first, shell_size);
            }
            return;
        }

        for widget in self.ic.widgets() {
            if self.ic.resolve(widget).is_some_and(|r| r.context.is_none()) {
                continue;
            }
            if !self.refresh_band_areas(xim, widget, shell_size) {
                return;
            }
        }
    }

    fn refresh_band_areas(
        &mut self,
        xim: &mut dyn XimBackend,
        widget: WidgetId,
        shell_size: PhysicalSize<u16>,
    ) -> bool {
        let Some(record) = self.ic.resolve(widget) else {
            return true;
        };
        let Some(context) = record.context else {
            return true;
        };
        let style = record.style;
        let band_y = shell_size
            .height
            .saturating_sub(self.session.reserved_height) as i16;

        let mut status_width = 0u16;
        if style.contains(InputStyle::STATUS_AREA) {
            let current = match xim.context_area(context, AreaKind::Status) {
                Ok(area) => area,
                Err(_) => return self.mark_record_failed(widget),
            };
            status_width = current.width;
            let mut status = AttrList::new();
            status.push(
                AttrName::Area,
                AttrValue::Area(Rect::new(0, band_y, current.width, current.height)),
            );
            let mut batch = AttrList::new();
            batch.push_nested(AttrName::StatusAttributes, status);
            if xim.set_context_values(context, batch).is_err() {
                return self.mark_record_failed(widget);
            }
        }

        if style.contains(InputStyle::PREEDIT_AREA) {
            let current = match xim.context_area(context, AreaKind::Preedit) {
                Ok(area) => area,
                Err(_) => return self.mark_record_failed(widget),
            };
            let width = if style.contains(InputStyle::STATUS_AREA) {
                shell_size.width.saturating_sub(status_width)
            } else {
                shell_size.width
            };
            let mut preedit = AttrList::new();
            preedit.push(
                AttrName::Area,
                AttrValue::Area(Rect::new(status_width as i16, band_y, width, current.height)),
            );
            let mut batch = AttrList::new();
            batch.push_nested(AttrName::PreeditAttributes, preedit);
            if xim.set_context_values(context, batch).is_err() {
                return self.mark_record_failed(widget);
            }
        }
        true
    }

    /// Mid-life platform failure: the context is gone. Mark the record
    /// sticky-failed; always reports `false` so batch loops can abort.
    pub(crate) fn mark_record_failed(&mut self, widget: WidgetId) -> bool {
        if let Some(record) = self.ic.resolve_mut(widget) {
            record.context = None;
            record.failed = true;
        }
        false
    }
}
