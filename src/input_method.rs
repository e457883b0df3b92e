//! Opening an input method: locale-modifier candidates and style choice.

use crate::platform::{MethodId, XimBackend};
use crate::style::{comma_entries, style_for_name, InputStyle};

/// One locale modifier we may try to open an input method under.
#[derive(Debug, Clone)]
struct PotentialModifier {
    modifiers: String,
    successful: Option<bool>,
}

impl PotentialModifier {
    fn new(modifiers: String) -> Self {
        PotentialModifier { modifiers, successful: None }
    }

    fn open(&mut self, xim: &mut dyn XimBackend) -> Option<MethodId> {
        let method = xim.open_method(&self.modifiers);
        self.successful = Some(method.is_some());
        method
    }
}

/// The ordered list of locale modifiers to try, derived from the shell's
/// configured method list. Logging this struct yields a sequential listing
/// of every modifier tried and whether it succeeded.
#[derive(Debug, Clone)]
pub(crate) struct PotentialModifiers {
    /// Either the explicit "no method" modifier (nothing configured) or one
    /// `@im=<name>` entry per configured method name.
    candidates: Vec<PotentialModifier>,
    /// The empty modifier, deferring entirely to the locale; tried last.
    fallback: PotentialModifier,
}

impl PotentialModifiers {
    pub(crate) fn new(method_list: Option<&str>) -> Self {
        let candidates = match method_list {
            None => vec![PotentialModifier::new("@im=none".into())],
            Some(list) => comma_entries(list)
                .map(|name| PotentialModifier::new(format!("@im={name}")))
                .collect(),
        };
        PotentialModifiers { candidates, fallback: PotentialModifier::new(String::new()) }
    }

    /// Try every candidate in order, then the empty-modifier fallback. The
    /// first successful open wins and later candidates are left untried.
    pub(crate) fn open(&mut self, xim: &mut dyn XimBackend) -> Option<MethodId> {
        for candidate in &mut self.candidates {
            if let Some(method) = candidate.open(xim) {
                return Some(method);
            }
        }
        self.fallback.open(xim)
    }
}

/// Pick the first style from the preference list that the method supports.
///
/// Unknown preference names are skipped; the original toolkit silently
/// retried the previous entry's mask in that case, which was never useful.
pub(crate) fn negotiate_style(
    preedit_type: &str,
    supported: &[InputStyle],
) -> Option<InputStyle> {
    for name in comma_entries(preedit_type) {
        let Some(style) = style_for_name(name) else {
            tracing::warn!("unknown preedit style name {:?}, skipping", name);
            continue;
        };
        if supported.contains(&style) {
            return Some(style);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttrList;
    use crate::geometry::Rect;
    use crate::platform::{
        AreaKind, Composed, ContextId, ContextLost, KeyEvent, RawLookup,
    };

    /// Minimal backend that records open attempts and accepts a configured
    /// modifier.
    struct OpenLog {
        accept: Option<&'static str>,
        attempts: Vec<String>,
    }

    impl OpenLog {
        fn rejecting() -> Self {
            OpenLog { accept: None, attempts: Vec::new() }
        }

        fn accepting(modifiers: &'static str) -> Self {
            OpenLog { accept: Some(modifiers), attempts: Vec::new() }
        }
    }

    impl XimBackend for OpenLog {
        fn open_method(&mut self, locale_modifiers: &str) -> Option<MethodId> {
            self.attempts.push(locale_modifiers.to_owned());
            (self.accept == Some(locale_modifiers)).then_some(MethodId(1))
        }

        fn close_method(&mut self, _: MethodId) {}

        fn supported_styles(&mut self, _: MethodId) -> Vec<InputStyle> {
            Vec::new()
        }

        fn create_context(&mut self, _: MethodId, _: AttrList) -> Option<ContextId> {
            None
        }

        fn destroy_context(&mut self, _: ContextId) {}

        fn set_context_values(&mut self, _: ContextId, _: AttrList) -> Result<(), ContextLost> {
            Ok(())
        }

        fn context_area(&mut self, _: ContextId, _: AreaKind) -> Result<Rect, ContextLost> {
            Err(ContextLost)
        }

        fn context_area_needed(&mut self, _: ContextId, _: AreaKind) -> Result<Rect, ContextLost> {
            Err(ContextLost)
        }

        fn focus_context(&mut self, _: ContextId) {}

        fn unfocus_context(&mut self, _: ContextId) {}

        fn lookup(&mut self, _: ContextId, _: &KeyEvent) -> Composed {
            Composed::default()
        }

        fn lookup_fallback(&mut self, _: &KeyEvent) -> RawLookup {
            RawLookup::default()
        }
    }

    #[test]
    fn unconfigured_search_order() {
        let mut xim = OpenLog::rejecting();
        assert!(PotentialModifiers::new(None).open(&mut xim).is_none());
        assert_eq!(xim.attempts, ["@im=none", ""]);
    }

    #[test]
    fn configured_entries_are_trimmed_and_tried_in_order() {
        let mut xim = OpenLog::rejecting();
        assert!(PotentialModifiers::new(Some(" kinput2 , skkinput ")).open(&mut xim).is_none());
        assert_eq!(xim.attempts, ["@im=kinput2", "@im=skkinput", ""]);
    }

    #[test]
    fn first_success_short_circuits() {
        let mut xim = OpenLog::accepting("@im=kinput2");
        let method = PotentialModifiers::new(Some("kinput2,skkinput")).open(&mut xim);
        assert_eq!(method, Some(MethodId(1)));
        assert_eq!(xim.attempts, ["@im=kinput2"]);
    }

    #[test]
    fn negotiation_takes_the_first_supported_preference() {
        let root = InputStyle::PREEDIT_NOTHING | InputStyle::STATUS_NOTHING;
        let over = InputStyle::PREEDIT_POSITION | InputStyle::STATUS_AREA;

        assert_eq!(negotiate_style("OverTheSpot,Root", &[root]), Some(root));
        assert_eq!(negotiate_style("OverTheSpot,Root", &[over, root]), Some(over));
        assert_eq!(negotiate_style("OffTheSpot", &[root]), None);
        assert_eq!(negotiate_style("Bogus,Root", &[root]), Some(root));
    }
}
