//! Per-widget input-context records and the shared/per-widget topology.

use bitflags::bitflags;

use crate::platform::{ContextId, FontSetId, Pixel, PixmapId, WidgetId};
use crate::style::InputStyle;

bitflags! {
    /// Context attributes tracked by the dirty/ever-set masks.
    ///
    /// A record carries two of these sets: `dirty` says what must be pushed
    /// to the platform context on the next sync, `ever_set` accumulates
    /// every attribute the widget has ever configured and is what gets
    /// replayed onto a freshly created shared context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IcAttrs: u8 {
        const FONT_SET = 1 << 0;
        const FOREGROUND = 1 << 1;
        const BACKGROUND = 1 << 2;
        const BACKGROUND_PIXMAP = 1 << 3;
        const CURSOR_POSITION = 1 << 4;
        const LINE_SPACING = 1 << 5;
        /// Input focus should be acquired on the next focus call.
        const FOCUS = 1 << 6;
        /// The six value attributes, i.e. everything except `FOCUS`.
        const VALUES = Self::FONT_SET.bits()
            | Self::FOREGROUND.bits()
            | Self::BACKGROUND.bits()
            | Self::BACKGROUND_PIXMAP.bits()
            | Self::CURSOR_POSITION.bits()
            | Self::LINE_SPACING.bits();
    }
}

/// A named per-widget attribute, as supplied by the configuration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetAttr {
    FontSet(FontSetId),
    Foreground(Pixel),
    Background(Pixel),
    BackgroundPixmap(PixmapId),
    InsertPosition(u32),
    LineSpacing(u16),
}

/// One widget's view of its input context.
#[derive(Debug, Clone)]
pub(crate) struct IcRecord {
    pub(crate) widget: WidgetId,
    /// Live platform context, present only between a successful create and
    /// an explicit destroy.
    pub(crate) context: Option<ContextId>,
    pub(crate) dirty: IcAttrs,
    pub(crate) ever_set: IcAttrs,
    pub(crate) font_set: Option<FontSetId>,
    pub(crate) foreground: Option<Pixel>,
    pub(crate) background: Option<Pixel>,
    pub(crate) bg_pixmap: Option<PixmapId>,
    pub(crate) cursor_position: Option<u32>,
    pub(crate) line_spacing: Option<u16>,
    pub(crate) focused: bool,
    /// Sticky: a creation attempt or mid-life platform call failed. Cleared
    /// only by reconnect.
    pub(crate) failed: bool,
    pub(crate) style: InputStyle,
}

impl IcRecord {
    pub(crate) fn new(widget: WidgetId) -> Self {
        IcRecord {
            widget,
            context: None,
            dirty: IcAttrs::empty(),
            ever_set: IcAttrs::empty(),
            font_set: None,
            foreground: None,
            background: None,
            bg_pixmap: None,
            cursor_position: None,
            line_spacing: None,
            focused: false,
            failed: false,
            style: InputStyle::empty(),
        }
    }

    /// Apply named attribute values, marking changed fields dirty.
    pub(crate) fn apply(&mut self, args: &[WidgetAttr]) {
        for arg in args {
            match *arg {
                WidgetAttr::FontSet(value) => {
                    if self.font_set != Some(value) {
                        self.font_set = Some(value);
                        self.dirty |= IcAttrs::FONT_SET;
                    }
                },
                WidgetAttr::Foreground(value) => {
                    if self.foreground != Some(value) {
                        self.foreground = Some(value);
                        self.dirty |= IcAttrs::FOREGROUND;
                    }
                },
                WidgetAttr::Background(value) => {
                    if self.background != Some(value) {
                        self.background = Some(value);
                        self.dirty |= IcAttrs::BACKGROUND;
                    }
                },
                WidgetAttr::BackgroundPixmap(value) => {
                    if self.bg_pixmap != Some(value) {
                        self.bg_pixmap = Some(value);
                        self.dirty |= IcAttrs::BACKGROUND_PIXMAP;
                    }
                },
                WidgetAttr::InsertPosition(value) => {
                    if self.cursor_position != Some(value) {
                        self.cursor_position = Some(value);
                        self.dirty |= IcAttrs::CURSOR_POSITION;
                    }
                },
                WidgetAttr::LineSpacing(value) => {
                    if self.line_spacing != Some(value) {
                        self.line_spacing = Some(value);
                        self.dirty |= IcAttrs::LINE_SPACING;
                    }
                },
            }
        }
        self.ever_set |= self.dirty;
    }

    pub(crate) fn clear_value_dirt(&mut self) {
        self.dirty &= !IcAttrs::VALUES;
    }
}

/// Shared-context state: the one record every widget multiplexes, plus
/// which widget the context is currently pointed at.
#[derive(Debug)]
pub(crate) struct SharedIc {
    pub(crate) record: IcRecord,
    pub(crate) current: Option<WidgetId>,
}

/// How widgets map to input contexts on this shell.
#[derive(Debug)]
pub(crate) enum Topology {
    /// Every registered widget owns its own context.
    PerWidget,
    /// All registered widgets multiplex one context, swapping the focus
    /// window and geometry on hand-off.
    Shared(SharedIc),
}

/// The per-shell table of registered widgets and their records.
#[derive(Debug)]
pub(crate) struct IcStore {
    /// Most-recently-registered first.
    records: Vec<IcRecord>,
    topology: Topology,
}

impl IcStore {
    pub(crate) fn new(shared: bool, shell: WidgetId) -> Self {
        let topology = if shared {
            Topology::Shared(SharedIc { record: IcRecord::new(shell), current: None })
        } else {
            Topology::PerWidget
        };
        IcStore { records: Vec::new(), topology }
    }

    pub(crate) fn is_shared(&self) -> bool {
        matches!(self.topology, Topology::Shared(_))
    }

    pub(crate) fn is_registered(&self, widget: WidgetId) -> bool {
        self.records.iter().any(|r| r.widget == widget)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn register(&mut self, widget: WidgetId) {
        self.records.insert(0, IcRecord::new(widget));
    }

    pub(crate) fn unregister(&mut self, widget: WidgetId) {
        self.records.retain(|r| r.widget != widget);
    }

    /// The widget whose context gets created at realize time in shared
    /// mode: the head of the registration list.
    pub(crate) fn first_widget(&self) -> Option<WidgetId> {
        self.records.first().map(|r| r.widget)
    }

    pub(crate) fn widgets(&self) -> Vec<WidgetId> {
        self.records.iter().map(|r| r.widget).collect()
    }

    /// The widget's own record, regardless of topology.
    pub(crate) fn record_of(&self, widget: WidgetId) -> Option<&IcRecord> {
        self.records.iter().find(|r| r.widget == widget)
    }

    pub(crate) fn record_of_mut(&mut self, widget: WidgetId) -> Option<&mut IcRecord> {
        self.records.iter_mut().find(|r| r.widget == widget)
    }

    /// The record that carries the widget's context: the shared record in
    /// shared mode, the widget's own otherwise. `None` if unregistered.
    pub(crate) fn resolve(&self, widget: WidgetId) -> Option<&IcRecord> {
        if !self.is_registered(widget) {
            return None;
        }
        match &self.topology {
            Topology::Shared(shared) => Some(&shared.record),
            Topology::PerWidget => self.record_of(widget),
        }
    }

    pub(crate) fn resolve_mut(&mut self, widget: WidgetId) -> Option<&mut IcRecord> {
        if !self.is_registered(widget) {
            return None;
        }
        match &mut self.topology {
            Topology::Shared(shared) => Some(&mut shared.record),
            Topology::PerWidget => self.records.iter_mut().find(|r| r.widget == widget),
        }
    }

    pub(crate) fn shared_mut(&mut self) -> Option<&mut SharedIc> {
        match &mut self.topology {
            Topology::Shared(shared) => Some(shared),
            Topology::PerWidget => None,
        }
    }

    pub(crate) fn current_widget(&self) -> Option<WidgetId> {
        match &self.topology {
            Topology::Shared(shared) => shared.current,
            Topology::PerWidget => None,
        }
    }

    pub(crate) fn set_current(&mut self, widget: Option<WidgetId>) {
        if let Topology::Shared(shared) = &mut self.topology {
            shared.current = widget;
        }
    }

    /// Copy onto the shared record every field the widget's own record has
    /// ever set and that differs from the shared record's cached value,
    /// marking each copied field dirty. A font change forces the cursor
    /// position dirty as well, since spot geometry depends on font metrics.
    ///
    /// With `honor_current` the copy only happens while the widget is the
    /// one the shared context is pointed at, so a background widget cannot
    /// clobber values another widget is actively using.
    pub(crate) fn propagate_shared(&mut self, widget: WidgetId, honor_current: bool) {
        let Topology::Shared(shared) = &mut self.topology else {
            return;
        };
        let Some(source) = self.records.iter().find(|r| r.widget == widget) else {
            return;
        };
        if honor_current && shared.current != Some(widget) {
            return;
        }

        let target = &mut shared.record;
        if source.ever_set.contains(IcAttrs::CURSOR_POSITION)
            && target.cursor_position != source.cursor_position
        {
            target.cursor_position = source.cursor_position;
            target.dirty |= IcAttrs::CURSOR_POSITION;
        }
        if source.ever_set.contains(IcAttrs::FONT_SET) && target.font_set != source.font_set {
            target.font_set = source.font_set;
            target.dirty |= IcAttrs::FONT_SET | IcAttrs::CURSOR_POSITION;
        }
        if source.ever_set.contains(IcAttrs::FOREGROUND)
            && target.foreground != source.foreground
        {
            target.foreground = source.foreground;
            target.dirty |= IcAttrs::FOREGROUND;
        }
        if source.ever_set.contains(IcAttrs::BACKGROUND)
            && target.background != source.background
        {
            target.background = source.background;
            target.dirty |= IcAttrs::BACKGROUND;
        }
        if source.ever_set.contains(IcAttrs::BACKGROUND_PIXMAP)
            && target.bg_pixmap != source.bg_pixmap
        {
            target.bg_pixmap = source.bg_pixmap;
            target.dirty |= IcAttrs::BACKGROUND_PIXMAP;
        }
        if source.ever_set.contains(IcAttrs::LINE_SPACING)
            && target.line_spacing != source.line_spacing
        {
            target.line_spacing = source.line_spacing;
            target.dirty |= IcAttrs::LINE_SPACING;
        }
    }

    /// Mark the widget's resolved record as wanting input focus.
    pub(crate) fn mark_focus_pending(&mut self, widget: WidgetId) {
        let shared = self.is_shared();
        let Some(record) = self.resolve_mut(widget) else {
            return;
        };
        if !record.focused || shared {
            record.dirty |= IcAttrs::FOCUS;
        }
        record.ever_set |= record.dirty;
    }

    /// Reconnect preparation: restore each record's dirty set from its
    /// ever-set mask and forget sticky failures.
    pub(crate) fn reset_for_reconnect(&mut self) {
        match &mut self.topology {
            Topology::Shared(shared) => {
                shared.record.dirty = shared.record.ever_set;
                shared.record.failed = false;
            },
            Topology::PerWidget => {
                for record in &mut self.records {
                    record.dirty = record.ever_set;
                    record.failed = false;
                }
            },
        }
    }
}
