//! Test doubles: a scriptable widget toolkit and platform IM service.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use dpi::{PhysicalPosition, PhysicalSize};
use xim_shell::{
    AreaKind, AttrList, AttrName, AttrValue, Composed, ContextId, ContextLost, FontSetId,
    InputStyle, KeyEvent, Keysym, LookupStatus, Margins, MethodId, RawLookup, Rect, Toolkit,
    WidgetId, WindowId, XimBackend,
};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn over_the_spot() -> InputStyle {
    InputStyle::PREEDIT_POSITION | InputStyle::STATUS_AREA
}

pub fn off_the_spot() -> InputStyle {
    InputStyle::PREEDIT_AREA | InputStyle::STATUS_AREA
}

pub fn root_style() -> InputStyle {
    InputStyle::PREEDIT_NOTHING | InputStyle::STATUS_NOTHING
}

/// A widget tree that answers geometry questions from plain tables.
pub struct FakeToolkit {
    shells: HashSet<WidgetId>,
    parents: HashMap<WidgetId, WidgetId>,
    windows: HashMap<WidgetId, WindowId>,
    sizes: HashMap<WidgetId, PhysicalSize<u16>>,
    margins: Margins,
    font_heights: HashMap<FontSetId, u16>,
    pub watched: HashSet<WidgetId>,
    pub watch_log: Vec<(WidgetId, bool)>,
}

impl FakeToolkit {
    pub fn new() -> Self {
        FakeToolkit {
            shells: HashSet::new(),
            parents: HashMap::new(),
            windows: HashMap::new(),
            sizes: HashMap::new(),
            margins: Margins { left: 2, right: 2, top: 1, bottom: 1 },
            font_heights: HashMap::new(),
            watched: HashSet::new(),
            watch_log: Vec::new(),
        }
    }

    pub fn add_shell(&mut self, shell: WidgetId, width: u16, height: u16) {
        self.shells.insert(shell);
        self.sizes.insert(shell, PhysicalSize::new(width, height));
    }

    pub fn add_widget(&mut self, widget: WidgetId, shell: WidgetId, width: u16, height: u16) {
        self.parents.insert(widget, shell);
        self.sizes.insert(widget, PhysicalSize::new(width, height));
    }

    /// Give the widget (or shell) a window, making it realized.
    pub fn realize(&mut self, widget: WidgetId) {
        self.windows.insert(widget, WindowId(widget.0 + 1000));
    }

    pub fn set_font_height(&mut self, font_set: FontSetId, height: u16) {
        self.font_heights.insert(font_set, height);
    }

    pub fn resize(&mut self, widget: WidgetId, width: u16, height: u16) {
        self.sizes.insert(widget, PhysicalSize::new(width, height));
    }

    pub fn height_of(&self, widget: WidgetId) -> u16 {
        self.sizes[&widget].height
    }

    pub fn window_of(&self, widget: WidgetId) -> WindowId {
        self.windows[&widget]
    }
}

impl Toolkit for FakeToolkit {
    fn vendor_shell(&self, widget: WidgetId) -> Option<WidgetId> {
        if self.shells.contains(&widget) {
            Some(widget)
        } else {
            self.parents.get(&widget).copied()
        }
    }

    fn window(&self, widget: WidgetId) -> Option<WindowId> {
        self.windows.get(&widget).copied()
    }

    fn size(&self, widget: WidgetId) -> PhysicalSize<u16> {
        self.sizes.get(&widget).copied().unwrap_or(PhysicalSize::new(100, 100))
    }

    fn set_height(&mut self, widget: WidgetId, height: u16) {
        let size = self.size(widget);
        self.sizes.insert(widget, PhysicalSize::new(size.width, height));
    }

    fn text_margins(&self, _: WidgetId) -> Margins {
        self.margins
    }

    fn caret_position(&self, _: WidgetId, index: u32) -> PhysicalPosition<i16> {
        PhysicalPosition::new((index as i16) * 7, 13)
    }

    fn font_height(&self, font_set: FontSetId) -> u16 {
        self.font_heights.get(&font_set).copied().unwrap_or(16)
    }

    fn watch_structure(&mut self, widget: WidgetId, watch: bool) {
        if watch {
            self.watched.insert(widget);
        } else {
            self.watched.remove(&widget);
        }
        self.watch_log.push((widget, watch));
    }
}

/// A platform IM double that records every call.
pub struct FakeXim {
    /// Locale modifiers that successfully open a method; `None` accepts any.
    pub accept: Option<Vec<String>>,
    pub styles: Vec<InputStyle>,
    pub fail_create: bool,
    next_id: u32,
    pub open_attempts: Vec<String>,
    pub open_methods: HashSet<MethodId>,
    pub live_contexts: HashSet<ContextId>,
    pub lost_contexts: HashSet<ContextId>,
    pub create_calls: usize,
    pub created: Vec<(MethodId, AttrList)>,
    pub set_calls: Vec<(ContextId, AttrList)>,
    pub focus_log: Vec<(ContextId, bool)>,
    pub area_needed: Rect,
    pub current_area: Rect,
}

impl FakeXim {
    pub fn new() -> Self {
        FakeXim {
            accept: None,
            styles: vec![over_the_spot(), off_the_spot(), root_style()],
            fail_create: false,
            next_id: 0,
            open_attempts: Vec::new(),
            open_methods: HashSet::new(),
            live_contexts: HashSet::new(),
            lost_contexts: HashSet::new(),
            create_calls: 0,
            created: Vec::new(),
            set_calls: Vec::new(),
            focus_log: Vec::new(),
            area_needed: Rect::new(0, 0, 80, 20),
            current_area: Rect::new(0, 0, 90, 18),
        }
    }

    pub fn accepting(modifiers: &[&str]) -> Self {
        FakeXim {
            accept: Some(modifiers.iter().map(|m| (*m).to_owned()).collect()),
            ..FakeXim::new()
        }
    }

    pub fn rejecting_all() -> Self {
        FakeXim { accept: Some(Vec::new()), ..FakeXim::new() }
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn last_set_for(&self, context: ContextId) -> Option<&AttrList> {
        self.set_calls.iter().rev().find(|(c, _)| *c == context).map(|(_, a)| a)
    }
}

impl XimBackend for FakeXim {
    fn open_method(&mut self, locale_modifiers: &str) -> Option<MethodId> {
        self.open_attempts.push(locale_modifiers.to_owned());
        let accepted = match &self.accept {
            None => true,
            Some(list) => list.iter().any(|m| m == locale_modifiers),
        };
        if !accepted {
            return None;
        }
        let method = MethodId(self.next());
        self.open_methods.insert(method);
        Some(method)
    }

    fn close_method(&mut self, method: MethodId) {
        self.open_methods.remove(&method);
    }

    fn supported_styles(&mut self, _: MethodId) -> Vec<InputStyle> {
        self.styles.clone()
    }

    fn create_context(&mut self, method: MethodId, attrs: AttrList) -> Option<ContextId> {
        self.create_calls += 1;
        if self.fail_create {
            return None;
        }
        let context = ContextId(self.next());
        self.live_contexts.insert(context);
        self.created.push((method, attrs));
        Some(context)
    }

    fn destroy_context(&mut self, context: ContextId) {
        self.live_contexts.remove(&context);
    }

    fn set_context_values(&mut self, context: ContextId, attrs: AttrList)
        -> Result<(), ContextLost> {
        if self.lost_contexts.contains(&context) {
            return Err(ContextLost);
        }
        self.set_calls.push((context, attrs));
        Ok(())
    }

    fn context_area(&mut self, context: ContextId, _: AreaKind) -> Result<Rect, ContextLost> {
        if self.lost_contexts.contains(&context) {
            return Err(ContextLost);
        }
        Ok(self.current_area)
    }

    fn context_area_needed(
        &mut self,
        context: ContextId,
        _: AreaKind,
    ) -> Result<Rect, ContextLost> {
        if self.lost_contexts.contains(&context) {
            return Err(ContextLost);
        }
        Ok(self.area_needed)
    }

    fn focus_context(&mut self, context: ContextId) {
        self.focus_log.push((context, true));
    }

    fn unfocus_context(&mut self, context: ContextId) {
        self.focus_log.push((context, false));
    }

    fn lookup(&mut self, _: ContextId, event: &KeyEvent) -> Composed {
        Composed {
            text: "気".into(),
            keysym: Some(Keysym(event.keycode)),
            status: LookupStatus::Both,
        }
    }

    fn lookup_fallback(&mut self, event: &KeyEvent) -> RawLookup {
        RawLookup { bytes: vec![event.keycode as u8], keysym: Some(Keysym(event.keycode)) }
    }
}

/// Dig a nested attribute list out of a batch.
pub fn nested(list: &AttrList, name: AttrName) -> Option<&AttrList> {
    match list.get(name) {
        Some(AttrValue::Nested(inner)) => Some(inner),
        _ => None,
    }
}
