//! Share Links
//!
//! A mix travels as a query string holding each layer's whole-percent volume:
//! `?rain=50&cafe=30&whitenoise=0&synth=0`.

use log::debug;

use crate::error::{Result, SoundscapeError};
use crate::mixer::layer::{LayerKind, Volume, VolumeMap};

/// Query string for `volumes`, layers in mixer order
///
/// Layers missing from the map are written as 0.
pub fn encode_query(volumes: &VolumeMap) -> String {
    LayerKind::ALL
        .iter()
        .map(|kind| {
            let volume = volumes.get(kind).copied().unwrap_or_default();
            format!("{}={}", kind, volume.percent())
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Full share link, or None when every layer is silent
///
/// ```
/// use soundscapes::mixer::{LayerKind, Volume, VolumeMap};
/// use soundscapes::state::share_link;
///
/// let mut volumes = VolumeMap::new();
/// volumes.insert(LayerKind::Rain, Volume::new(50));
/// assert_eq!(
///     share_link("https://example.com/mix", &volumes).unwrap(),
///     "https://example.com/mix?rain=50&cafe=0&whitenoise=0&synth=0"
/// );
/// assert_eq!(share_link("https://example.com/mix", &VolumeMap::new()), None);
/// ```
pub fn share_link(base: &str, volumes: &VolumeMap) -> Option<String> {
    if volumes.values().all(Volume::is_silent) {
        return None;
    }

    let base = base.split(['?', '#']).next().unwrap_or(base);
    Some(format!("{}?{}", base, encode_query(volumes)))
}

/// Read layer volumes from a share link or bare query string
///
/// Keys and values are percent-decoded (`+` reads as a space). Unknown
/// parameters and unparsable values are skipped; values are clamped to 0..=100.
///
/// # Errors
/// * `InvalidShareLink` - if the link names none of the four layers
pub fn decode_share_link(link: &str) -> Result<VolumeMap> {
    let query = match link.split_once('?') {
        Some((_, query)) => query,
        None => link,
    };
    let query = query.split('#').next().unwrap_or(query);

    let mut volumes = VolumeMap::new();
    let mut named_any = false;

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let (key, value) = (percent_decode(key), percent_decode(value));
        let Ok(kind) = key.parse::<LayerKind>() else {
            debug!("ignoring share parameter '{}'", key);
            continue;
        };
        named_any = true;

        match value.parse::<Volume>() {
            Ok(volume) => {
                volumes.insert(kind, volume);
            }
            Err(e) => debug!("ignoring {} in share link: {}", kind, e),
        }
    }

    if !named_any {
        return Err(SoundscapeError::InvalidShareLink {
            reason: "no layer volumes found".to_string(),
        });
    }

    Ok(volumes)
}

/// Decode `%XX` escapes and `+`; malformed escapes are kept as written.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => {
                let escape = raw
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = escape {
                    decoded.push(byte);
                    i += 3;
                    continue;
                }
                decoded.push(b'%');
            }
            byte => decoded.push(byte),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
