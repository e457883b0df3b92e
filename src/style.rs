//! Input styles and per-shell IME configuration.

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Pre-edit/status presentation mask negotiated with the input method.
    ///
    /// The values mirror the platform's style constants: the low byte holds
    /// the pre-edit mode, the high byte the status mode. A negotiated style
    /// always combines exactly one of each.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputStyle: u16 {
        /// Pre-edit text is drawn by the input method in a dedicated
        /// off-the-spot area inside the shell.
        const PREEDIT_AREA = 0x0001;
        /// Pre-edit text is drawn by the client from callbacks.
        const PREEDIT_CALLBACKS = 0x0002;
        /// Pre-edit text follows a spot location over the insertion cursor.
        const PREEDIT_POSITION = 0x0004;
        /// Pre-edit text is drawn in the input method's own (root) window.
        const PREEDIT_NOTHING = 0x0008;
        /// Mode/state indicators are drawn in a status area inside the shell.
        const STATUS_AREA = 0x0100;
        /// Status is reported through callbacks.
        const STATUS_CALLBACKS = 0x0200;
        /// Status is drawn in the input method's own window.
        const STATUS_NOTHING = 0x0400;
    }
}

impl InputStyle {
    /// Whether this style draws anything inside the client's windows, i.e.
    /// whether appearance attributes and geometry must be communicated.
    pub fn uses_client_area(self) -> bool {
        self.intersects(Self::PREEDIT_AREA | Self::PREEDIT_POSITION | Self::STATUS_AREA)
    }
}

/// Looks up the style combination sold under a presentation-style name.
pub(crate) fn style_for_name(name: &str) -> Option<InputStyle> {
    match name {
        "OverTheSpot" => Some(InputStyle::PREEDIT_POSITION | InputStyle::STATUS_AREA),
        "OffTheSpot" => Some(InputStyle::PREEDIT_AREA | InputStyle::STATUS_AREA),
        "Root" => Some(InputStyle::PREEDIT_NOTHING | InputStyle::STATUS_NOTHING),
        _ => None,
    }
}

/// Iterates the entries of a comma-separated list, trimmed of surrounding
/// whitespace, skipping empty fragments.
pub(crate) fn comma_entries(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

/// Per-shell IME session configuration.
///
/// These correspond to the resource-style settings a vendor shell is
/// configured with; they are fixed when the shell extension is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImeOptions {
    /// Whether an input method should be opened at all. When `false` every
    /// widget on the shell uses plain fallback key lookup.
    pub enable: bool,
    /// Comma-separated list of input-method names to try as locale
    /// modifiers, in order. `None` requests the explicit "no method"
    /// modifier first.
    pub input_method: Option<String>,
    /// Comma-separated, ordered preference list of presentation style names
    /// (`OverTheSpot`, `OffTheSpot`, `Root`).
    pub preedit_type: String,
    /// Multiplex all of the shell's text widgets over one shared input
    /// context instead of creating one per widget.
    pub shared_context: bool,
}

impl Default for ImeOptions {
    fn default() -> Self {
        ImeOptions {
            enable: true,
            input_method: None,
            preedit_type: "OverTheSpot,OffTheSpot,Root".into(),
            shared_context: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_entries_trim_and_skip_blanks() {
        let entries: Vec<_> = comma_entries(" kinput2 , , skkinput ,").collect();
        assert_eq!(entries, ["kinput2", "skkinput"]);
    }

    #[test]
    fn style_names_map_to_masks() {
        assert_eq!(
            style_for_name("OverTheSpot"),
            Some(InputStyle::PREEDIT_POSITION | InputStyle::STATUS_AREA)
        );
        assert_eq!(
            style_for_name("Root"),
            Some(InputStyle::PREEDIT_NOTHING | InputStyle::STATUS_NOTHING)
        );
        assert_eq!(style_for_name("OnTheSpot"), None);
    }

    #[test]
    fn root_style_uses_no_client_area() {
        assert!(!(InputStyle::PREEDIT_NOTHING | InputStyle::STATUS_NOTHING).uses_client_area());
        assert!((InputStyle::PREEDIT_POSITION | InputStyle::STATUS_AREA).uses_client_area());
    }
}
