//! Share links for a single countdown.
//!
//! A locator looks like `countdown://share?data=<base64>` where the base64
//! text (standard alphabet, padded) wraps a compressed MessagePack map of the
//! shareable fields. Fields are keyed by name, so payloads written by newer
//! or older app versions still decode: unknown keys are skipped and missing
//! optional keys read as absent.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::compression::{Deflate, StreamCodec};
use crate::constants::{LOCATOR_DATA_KEY, LOCATOR_HOST, LOCATOR_SCHEME};
use crate::error::{CountdownError, InterchangeError};
use crate::model::Countdown;
use crate::types::{BackgroundStyle, CountdownId, FontStyle};

/// The shareable subset of a [`Countdown`]. Carries no identity, archive
/// state, reminders or peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    pub title: String,
    pub target_at: DateTime<Utc>,
    pub time_zone: String,
    #[serde(default)]
    pub font_style: String,
    #[serde(default)]
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_bytes")]
    pub image: Option<Vec<u8>>,
}

impl SharePayload {
    pub fn from_countdown(countdown: &Countdown) -> Self {
        Self {
            title: countdown.title.clone(),
            target_at: countdown.target_at,
            time_zone: countdown.time_zone.clone(),
            font_style: countdown.font_style.as_tag().to_string(),
            background: countdown.background.as_tag().to_string(),
            color_hex: countdown.color_hex.clone(),
            image: countdown.image.clone(),
        }
    }

    /// Build a brand-new local record from the payload.
    pub fn into_countdown(self) -> Countdown {
        Countdown {
            id: CountdownId::new(),
            title: self.title,
            target_at: self.target_at,
            time_zone: self.time_zone,
            font_style: FontStyle::from_tag(&self.font_style),
            background: BackgroundStyle::from_tag(&self.background),
            color_hex: self.color_hex,
            image: self.image,
            is_archived: false,
            is_shared: false,
            peers: Vec::new(),
            reminder_offsets: Vec::new(),
            last_edited_at: Utc::now(),
        }
    }

    /// Serialize as a MessagePack map keyed by field name.
    pub fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(data)
    }
}

/// Build a share locator with the default codec. `None` means some stage of
/// the export failed; the cause is logged.
pub fn export_locator(countdown: &Countdown) -> Option<Url> {
    export_locator_with(&Deflate::default(), countdown)
}

pub fn export_locator_with(codec: &dyn StreamCodec, countdown: &Countdown) -> Option<Url> {
    match encode_locator(codec, countdown) {
        Ok(url) => {
            tracing::debug!(
                id = %countdown.id,
                locator_len = url.as_str().len(),
                "exported countdown"
            );
            Some(url)
        }
        Err(e) => {
            tracing::warn!(id = %countdown.id, error = %e, "countdown export failed");
            None
        }
    }
}

fn encode_locator(codec: &dyn StreamCodec, countdown: &Countdown) -> Result<Url, CountdownError> {
    let payload = SharePayload::from_countdown(countdown)
        .to_bytes()
        .map_err(|e| CountdownError::Invalid(format!("payload serialization: {e}")))?;
    let packed = codec.compress(&payload)?;

    let mut url = Url::parse(&format!("{LOCATOR_SCHEME}://{LOCATOR_HOST}"))
        .map_err(|e| CountdownError::Invalid(format!("locator base: {e}")))?;
    url.query_pairs_mut()
        .append_pair(LOCATOR_DATA_KEY, &STANDARD.encode(packed));
    Ok(url)
}

/// Decode a share locator into a new, unsaved countdown.
pub fn import_record(locator: &str) -> Result<Countdown, InterchangeError> {
    import_record_with(&Deflate::default(), locator)
}

pub fn import_record_with(
    codec: &dyn StreamCodec,
    locator: &str,
) -> Result<Countdown, InterchangeError> {
    let packed = locator_data(locator)?;
    let bytes = codec.decompress(&packed)?;
    if bytes.is_empty() {
        return Err(InterchangeError::DecodeFailed("empty payload".into()));
    }

    let payload = SharePayload::from_bytes(&bytes)
        .map_err(|e| InterchangeError::DecodeFailed(e.to_string()))?;
    let countdown = payload.into_countdown();
    countdown
        .validate()
        .map_err(|e| InterchangeError::DecodeFailed(e.to_string()))?;

    tracing::debug!(id = %countdown.id, "imported shared countdown");
    Ok(countdown)
}

/// Check scheme, host and path, then return the base64-decoded `data` value.
fn locator_data(locator: &str) -> Result<Vec<u8>, InterchangeError> {
    let url = Url::parse(locator.trim())
        .map_err(|e| InterchangeError::InvalidLocator(format!("not a URL: {e}")))?;

    if url.scheme() != LOCATOR_SCHEME {
        return Err(InterchangeError::InvalidLocator(format!(
            "unexpected scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str() != Some(LOCATOR_HOST) {
        return Err(InterchangeError::InvalidLocator(format!(
            "unexpected host '{}'",
            url.host_str().unwrap_or_default()
        )));
    }
    if !matches!(url.path(), "" | "/") {
        return Err(InterchangeError::InvalidLocator(format!(
            "unexpected path '{}'",
            url.path()
        )));
    }

    let data = url
        .query_pairs()
        .find(|(key, _)| key == LOCATOR_DATA_KEY)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| InterchangeError::InvalidLocator("missing data parameter".into()))?;

    // Some messengers hand back '+' unescaped, which form decoding turns
    // into a space.
    let data = data.replace(' ', "+");
    STANDARD
        .decode(data.as_bytes())
        .map_err(|e| InterchangeError::InvalidLocator(format!("bad base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompressionError;
    use crate::types::PeerRef;
    use chrono::TimeZone;

    fn sample() -> Countdown {
        let mut c = Countdown::new(
            "Trip to Lisbon",
            Utc.with_ymd_and_hms(2031, 6, 14, 17, 45, 12).unwrap(),
            "Europe/Lisbon",
        );
        c.font_style = FontStyle::Rounded;
        c.color_hex = Some("#3366FF".into());
        c.is_archived = true;
        c.is_shared = true;
        c.peers = vec![PeerRef("friend-1".into())];
        c.reminder_offsets = vec![-1440, -60];
        c
    }

    fn locator_for(payload_bytes: &[u8]) -> String {
        let packed = Deflate::default().compress(payload_bytes).unwrap();
        let mut url = Url::parse("countdown://share").unwrap();
        url.query_pairs_mut()
            .append_pair("data", &STANDARD.encode(packed));
        url.to_string()
    }

    struct FailingCodec;

    impl StreamCodec for FailingCodec {
        fn compress(&self, _: &[u8]) -> Result<Vec<u8>, CompressionError> {
            Err(CompressionError::CompressionFailed("boom".into()))
        }
        fn decompress(&self, _: &[u8]) -> Result<Vec<u8>, CompressionError> {
            Err(CompressionError::DecompressionFailed("boom".into()))
        }
    }

    #[test]
    fn test_roundtrip_creates_new_record() {
        let original = sample();
        let url = export_locator(&original).expect("export should work");
        let imported = import_record(url.as_str()).expect("import should work");

        assert_eq!(imported.title, original.title);
        assert_eq!(imported.target_at, original.target_at);
        assert_eq!(imported.time_zone, original.time_zone);
        assert_eq!(imported.font_style, original.font_style);
        assert_eq!(imported.background, original.background);
        assert_eq!(imported.color_hex, original.color_hex);
        assert_eq!(imported.image, original.image);

        assert_ne!(imported.id, original.id);
        assert!(!imported.is_archived);
        assert!(!imported.is_shared);
        assert!(imported.peers.is_empty());
        assert!(imported.reminder_offsets.is_empty());
    }

    #[test]
    fn test_roundtrip_with_image_bytes() {
        let mut original = sample();
        original.background = BackgroundStyle::Image;
        original.color_hex = None;
        original.image = Some((0..=255u8).cycle().take(5000).collect());

        let url = export_locator(&original).unwrap();
        let imported = import_record(url.as_str()).unwrap();
        assert_eq!(imported.background, BackgroundStyle::Image);
        assert_eq!(imported.image, original.image);
        assert_eq!(imported.color_hex, None);
    }

    #[test]
    fn test_locator_shape() {
        let url = export_locator(&sample()).unwrap();
        assert_eq!(url.scheme(), "countdown");
        assert_eq!(url.host_str(), Some("share"));
        let keys: Vec<_> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["data".to_string()]);
    }

    #[test]
    fn test_export_failure_is_none() {
        assert!(export_locator_with(&FailingCodec, &sample()).is_none());
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let url = export_locator(&sample()).unwrap();
        let bad = url.as_str().replacen("countdown://", "https://", 1);
        assert!(matches!(
            import_record(&bad),
            Err(InterchangeError::InvalidLocator(_))
        ));
    }

    #[test]
    fn test_wrong_host_rejected() {
        let url = export_locator(&sample()).unwrap();
        let bad = url.as_str().replacen("://share", "://elsewhere", 1);
        assert!(matches!(
            import_record(&bad),
            Err(InterchangeError::InvalidLocator(_))
        ));
    }

    #[test]
    fn test_extra_path_rejected() {
        let url = export_locator(&sample()).unwrap();
        let bad = url.as_str().replacen("://share?", "://share/extra?", 1);
        assert!(matches!(
            import_record(&bad),
            Err(InterchangeError::InvalidLocator(_))
        ));

        let slash = url.as_str().replacen("://share?", "://share/?", 1);
        assert_eq!(import_record(&slash).unwrap().title, "Trip to Lisbon");
    }

    #[test]
    fn test_missing_data_rejected() {
        for locator in [
            "countdown://share",
            "countdown://share?other=abc",
            "countdown://share?data=",
            "not a url at all",
        ] {
            assert!(
                matches!(import_record(locator), Err(InterchangeError::InvalidLocator(_))),
                "{locator} should be an invalid locator"
            );
        }
    }

    #[test]
    fn test_non_base64_rejected() {
        assert!(matches!(
            import_record("countdown://share?data=%%%not-base64!!"),
            Err(InterchangeError::InvalidLocator(_))
        ));
    }

    #[test]
    fn test_unescaped_plus_tolerated() {
        let url = export_locator(&sample()).unwrap();
        let data = url
            .query_pairs()
            .find(|(k, _)| k == "data")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let raw = format!("countdown://share?data={data}");
        assert!(import_record(&raw).is_ok());
    }

    #[test]
    fn test_truncated_payload_is_decode_failure() {
        let payload = SharePayload::from_countdown(&sample()).to_bytes().unwrap();
        let packed = Deflate::default().compress(&payload).unwrap();
        let truncated = &packed[..packed.len() - 3];
        let mut url = Url::parse("countdown://share").unwrap();
        url.query_pairs_mut()
            .append_pair("data", &STANDARD.encode(truncated));

        assert!(matches!(
            import_record(url.as_str()),
            Err(InterchangeError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_not_a_payload_is_decode_failure() {
        let locator = locator_for(b"just some compressed text");
        assert!(matches!(
            import_record(&locator),
            Err(InterchangeError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_decompression_failure_maps_to_decode_failure() {
        let url = export_locator(&sample()).unwrap();
        assert!(matches!(
            import_record_with(&FailingCodec, url.as_str()),
            Err(InterchangeError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_invalid_payload_contents_rejected() {
        let mut payload = SharePayload::from_countdown(&sample());
        payload.title = String::new();
        let locator = locator_for(&payload.to_bytes().unwrap());
        assert!(matches!(
            import_record(&locator),
            Err(InterchangeError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_extra_and_missing_fields_decode() {
        // A payload from a newer version with an extra key and without the
        // optional ones.
        #[derive(Serialize)]
        struct FuturePayload {
            title: String,
            target_at: DateTime<Utc>,
            time_zone: String,
            font_style: String,
            sticker: String,
        }

        let future = FuturePayload {
            title: "New Year".into(),
            target_at: Utc.with_ymd_and_hms(2032, 1, 1, 0, 0, 0).unwrap(),
            time_zone: "Asia/Tokyo".into(),
            font_style: "calligraphy".into(),
            sticker: "fireworks".into(),
        };
        let locator = locator_for(&rmp_serde::to_vec_named(&future).unwrap());

        let imported = import_record(&locator).unwrap();
        assert_eq!(imported.title, "New Year");
        assert_eq!(imported.time_zone, "Asia/Tokyo");
        assert_eq!(imported.font_style, FontStyle::Default);
        assert_eq!(imported.background, BackgroundStyle::Color);
        assert_eq!(imported.color_hex, None);
        assert_eq!(imported.image, None);
    }

    #[test]
    fn test_payload_is_field_tagged() {
        let bytes = SharePayload::from_countdown(&sample()).to_bytes().unwrap();
        let value: serde_json::Value = rmp_serde::from_slice(&bytes).unwrap();
        let map = value.as_object().expect("payload should be a map");
        assert!(map.contains_key("title"));
        assert!(map.contains_key("target_at"));
        assert!(!map.contains_key("id"));
        assert!(!map.contains_key("reminder_offsets"));
    }
}
