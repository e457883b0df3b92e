//! Degraded key decoding when no input context is available.
//!
//! Without a context, key events go through the plain platform lookup and
//! come back as a narrow byte stream. Widening is one code unit at a time —
//! deliberately limited to single-byte (Latin-1) behavior, never attempting
//! any platform composition.

use smol_str::SmolStr;

use crate::platform::{Composed, LookupStatus, RawLookup};

/// Widen a narrow fallback lookup into the composed result shape.
pub(crate) fn widen_fallback(raw: RawLookup) -> Composed {
    let text: SmolStr = raw.bytes.iter().map(|&byte| char::from(byte)).collect();
    let status = match (text.is_empty(), raw.keysym.is_some()) {
        (true, false) => LookupStatus::Nothing,
        (false, false) => LookupStatus::Chars,
        (true, true) => LookupStatus::Keysym,
        (false, true) => LookupStatus::Both,
    };
    Composed { text, keysym: raw.keysym, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Keysym;

    #[test]
    fn bytes_widen_one_to_one() {
        let composed = widen_fallback(RawLookup {
            bytes: vec![b'a', 0xA9, 0xFF],
            keysym: None,
        });
        assert_eq!(composed.text, "a\u{a9}\u{ff}");
        assert_eq!(composed.status, LookupStatus::Chars);
    }

    #[test]
    fn status_reflects_content() {
        let empty = widen_fallback(RawLookup::default());
        assert_eq!(empty.status, LookupStatus::Nothing);

        let sym_only = widen_fallback(RawLookup { bytes: vec![], keysym: Some(Keysym(0xff0d)) });
        assert_eq!(sym_only.status, LookupStatus::Keysym);

        let both = widen_fallback(RawLookup { bytes: vec![b'x'], keysym: Some(Keysym(0x78)) });
        assert_eq!(both.status, LookupStatus::Both);
        assert_eq!(both.keysym, Some(Keysym(0x78)));
    }
}
