//! Batched attribute lists for the platform's nested-attribute protocol.
//!
//! The platform expects context configuration as variable-length lists of
//! named values, with pre-edit and status settings nested one level deep.
//! [`AttrList`] is the growable, ordered form of those lists: callers push
//! exactly the fields they have to say and hand the batch over wholesale.

use dpi::PhysicalPosition;

use crate::geometry::Rect;
use crate::platform::{FontSetId, Pixel, PixmapId, WindowId};
use crate::style::InputStyle;

/// Attribute names understood by the platform binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrName {
    InputStyle,
    ClientWindow,
    FocusWindow,
    PreeditAttributes,
    StatusAttributes,
    FontSet,
    Foreground,
    Background,
    BackgroundPixmap,
    LineSpace,
    SpotLocation,
    Area,
}

/// A value carried alongside an [`AttrName`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Style(InputStyle),
    Window(WindowId),
    FontSet(FontSetId),
    Pixel(Pixel),
    Pixmap(PixmapId),
    Spacing(u16),
    Spot(PhysicalPosition<i16>),
    Area(Rect),
    Nested(AttrList),
}

/// An ordered batch of `(name, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttrList {
    entries: Vec<(AttrName, AttrValue)>,
}

impl AttrList {
    pub fn new() -> Self {
        AttrList::default()
    }

    pub fn push(&mut self, name: AttrName, value: AttrValue) {
        self.entries.push((name, value));
    }

    /// Nest a sub-list under `name`, but only when it has content.
    pub fn push_nested(&mut self, name: AttrName, nested: AttrList) {
        if !nested.is_empty() {
            self.entries.push((name, AttrValue::Nested(nested)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(AttrName, AttrValue)] {
        &self.entries
    }

    /// First value stored under `name`, if any.
    pub fn get(&self, name: AttrName) -> Option<&AttrValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(AttrName, AttrValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_preserve_push_order() {
        let mut attrs = AttrList::new();
        attrs.push(AttrName::Foreground, AttrValue::Pixel(Pixel(1)));
        attrs.push(AttrName::Background, AttrValue::Pixel(Pixel(2)));
        attrs.push(AttrName::Foreground, AttrValue::Pixel(Pixel(3)));

        let names: Vec<_> = attrs.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            [AttrName::Foreground, AttrName::Background, AttrName::Foreground]
        );
        // Lookup sees the first entry, the platform consumes all of them.
        assert_eq!(attrs.get(AttrName::Foreground), Some(&AttrValue::Pixel(Pixel(1))));
    }

    #[test]
    fn empty_nested_lists_are_dropped() {
        let mut attrs = AttrList::new();
        attrs.push_nested(AttrName::PreeditAttributes, AttrList::new());
        assert!(attrs.is_empty());

        let mut pe = AttrList::new();
        pe.push(AttrName::LineSpace, AttrValue::Spacing(12));
        attrs.push_nested(AttrName::PreeditAttributes, pe);
        assert_eq!(attrs.len(), 1);
    }
}
