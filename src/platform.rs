//! The opaque platform input-method service and its handle types.
//!
//! The wire protocol, locale negotiation and event transport all live on
//! the other side of [`XimBackend`]; this crate only sequences the calls.

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attributes::AttrList;
use crate::geometry::Rect;
use crate::style::InputStyle;

macro_rules! xid {
    ($(#[$doc:meta] $name:ident),* $(,)?) => {$(
        #[$doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub u32);
    )*};
}

xid! {
    /// A widget handle issued by the owning toolkit.
    WidgetId,
    /// A platform window handle.
    WindowId,
    /// An open input-method handle.
    MethodId,
    /// A live input-context handle.
    ContextId,
    /// A loaded font set.
    FontSetId,
    /// A server-side pixmap.
    PixmapId,
}

/// A color value in the platform's pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pixel(pub u32);

/// A key symbol as reported by key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keysym(pub u32);

/// The raw key press handed through to the input method untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyEvent {
    pub keycode: u32,
    pub modifiers: u32,
}

/// Which on-screen component an area query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Preedit,
    Status,
}

/// What a key lookup produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LookupStatus {
    #[default]
    Nothing,
    Chars,
    Keysym,
    Both,
}

/// Composed (wide) text from a key lookup against a live context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Composed {
    pub text: SmolStr,
    pub keysym: Option<Keysym>,
    pub status: LookupStatus,
}

/// Narrow byte output of the plain fallback key lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawLookup {
    pub bytes: Vec<u8>,
    pub keysym: Option<Keysym>,
}

/// The platform reported that an input context no longer exists.
///
/// The record that owned the handle is marked permanently failed and stops
/// issuing calls until an explicit reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLost;

impl fmt::Display for ContextLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("the input context was destroyed by the platform")
    }
}

impl Error for ContextLost {}

/// The platform input-method service.
///
/// Implementations bind this to the real protocol (Xlib, a standalone XIM
/// client, a test double). All calls are synchronous and must happen on the
/// shell's event-processing thread; the trait is deliberately narrow so the
/// lifecycle logic above it stays protocol-agnostic.
pub trait XimBackend {
    /// Attempt to open an input method under the given locale modifiers.
    fn open_method(&mut self, locale_modifiers: &str) -> Option<MethodId>;

    fn close_method(&mut self, method: MethodId);

    /// The input styles the method reports as supported.
    fn supported_styles(&mut self, method: MethodId) -> Vec<InputStyle>;

    /// Create an input context from a batched attribute list.
    fn create_context(&mut self, method: MethodId, attrs: AttrList) -> Option<ContextId>;

    fn destroy_context(&mut self, context: ContextId);

    /// Apply a batched attribute list to a live context.
    fn set_context_values(&mut self, context: ContextId, attrs: AttrList)
        -> Result<(), ContextLost>;

    /// Query the current on-screen area of a style component.
    fn context_area(&mut self, context: ContextId, kind: AreaKind) -> Result<Rect, ContextLost>;

    /// Query the area the input method wants for a style component.
    fn context_area_needed(
        &mut self,
        context: ContextId,
        kind: AreaKind,
    ) -> Result<Rect, ContextLost>;

    fn focus_context(&mut self, context: ContextId);

    fn unfocus_context(&mut self, context: ContextId);

    /// Composed key lookup against a live context.
    fn lookup(&mut self, context: ContextId, event: &KeyEvent) -> Composed;

    /// Plain key lookup, used when no context is available.
    fn lookup_fallback(&mut self, event: &KeyEvent) -> RawLookup;
}
