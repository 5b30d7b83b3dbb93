//! Payload normalizer.
//!
//! Turns a raw status broadcast into a canonical [`Device`]. Pure: no
//! shared state, the caller supplies the custom-name lookup result and the
//! observed source address.

pub mod alias;
pub mod parse;

pub use alias::{Field, FieldValue, Payload, ALIASES};
pub use parse::{parse_hashrate_kh, parse_shares};

use chrono::Utc;

use crate::error::NormalizeError;
use crate::types::{Device, DeviceStatus};

/// Normalize raw datagram bytes.
///
/// `source` is the address the packet arrived from; it is used only when
/// the payload carries no address of its own.
pub fn normalize(
    data: &[u8],
    source: Option<&str>,
    custom_name: Option<&str>,
) -> Result<Device, NormalizeError> {
    let payload = Payload::parse(data)?;
    normalize_payload(&payload, source, custom_name)
}

/// Best-guess id for a payload before full normalization.
pub fn resolve_address(payload: &Payload, source: Option<&str>) -> Option<String> {
    payload.embedded_address().or_else(|| {
        source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Build a canonical record from an already parsed payload.
pub fn normalize_payload(
    payload: &Payload,
    source: Option<&str>,
    custom_name: Option<&str>,
) -> Result<Device, NormalizeError> {
    let id = resolve_address(payload, source).ok_or(NormalizeError::MissingAddress)?;

    let name = derive_name(payload, &id);
    let hashrate_raw = payload.text(Field::HashRate);
    let share = payload.text(Field::Shares);
    let (accepted_shares, rejected_shares) = parse_shares(share.as_deref());

    let mut device = Device {
        hashrate_kh: parse_hashrate_kh(hashrate_raw.as_deref()),
        power: payload.number(Field::Power).unwrap_or(0.0),
        temperature: payload.number(Field::Temperature).unwrap_or(0.0),
        status: DeviceStatus::Online,
        last_seen: Utc::now(),
        board_type: payload.text(Field::BoardType),
        hashrate_raw,
        share,
        accepted_shares,
        rejected_shares,
        valid: payload.integer(Field::Valid),
        net_diff: payload.text(Field::NetDiff),
        pool_diff: payload.text(Field::PoolDiff),
        last_diff: payload.text(Field::LastDiff),
        best_diff: payload.text(Field::BestDiff),
        progress: payload.integer(Field::Progress),
        rssi: payload.integer(Field::Rssi),
        free_heap: payload.number(Field::FreeHeap),
        uptime: payload.text(Field::Uptime),
        version: payload.text(Field::Version),
        pool_in_use: payload.text(Field::PoolInUse),
        update_time: payload.text(Field::UpdateTime),
        display_name: name.clone(),
        name,
        custom_name: None,
        id,
    };
    device.apply_custom_name(custom_name.map(str::to_string));

    Ok(device)
}

/// Payload name, else `<BoardType>-<last octet>`, else `Miner-<last octet>`.
fn derive_name(payload: &Payload, id: &str) -> String {
    let suffix = id.rsplit('.').next().unwrap_or(id);

    if let Some(name) = payload.non_blank(Field::Name) {
        return name;
    }
    if let Some(board) = payload.non_blank(Field::BoardType) {
        return format!("{}-{}", board, suffix);
    }
    format!("Miner-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NERDMINER: &str = r#"{
        "ip": "192.168.1.42",
        "BoardType": "NerdMinerV2",
        "HashRate": "113.1K",
        "Share": "12/1/7.7%",
        "NetDiff": "88.1T",
        "PoolDiff": "0.0015",
        "LastDiff": "0.0021",
        "BestDiff": "4.52M",
        "Valid": 0,
        "Progress": 0,
        "Temp": 48.2,
        "RSSI": -61,
        "FreeHeap": 123456,
        "Uptime": "000d 01:23:46",
        "Version": "1.6.3",
        "PoolInUse": "public-pool.io:21496",
        "UpdateTime": "2024-05-01 12:00:00"
    }"#;

    #[test]
    fn test_normalize_full_payload() {
        let device = normalize(NERDMINER.as_bytes(), Some("192.168.1.99"), None).unwrap();

        assert_eq!(device.id, "192.168.1.42");
        assert_eq!(device.name, "NerdMinerV2-42");
        assert_eq!(device.display_name, "NerdMinerV2-42");
        assert!((device.hashrate_kh - 113.1).abs() < 1e-9);
        assert_eq!(device.accepted_shares, Some(12));
        assert_eq!(device.rejected_shares, Some(1));
        assert_eq!(device.temperature, 48.2);
        assert_eq!(device.power, 0.0);
        assert_eq!(device.rssi, Some(-61));
        assert_eq!(device.free_heap, Some(123456.0));
        assert_eq!(device.valid, Some(0));
        assert_eq!(device.version.as_deref(), Some("1.6.3"));
        assert_eq!(device.pool_in_use.as_deref(), Some("public-pool.io:21496"));
        assert_eq!(device.hashrate_raw.as_deref(), Some("113.1K"));
        assert_eq!(device.status, DeviceStatus::Online);
    }

    #[test]
    fn test_lowercase_variant_keys() {
        let json = r#"{"IP": "10.0.0.3", "Name": "garage", "hashrate": "0.8M",
                       "shares": "5/0", "temperature": "55.5", "power": "12.5",
                       "valid": "4", "uptime": "3600"}"#;
        let device = normalize(json.as_bytes(), None, None).unwrap();

        assert_eq!(device.id, "10.0.0.3");
        assert_eq!(device.name, "garage");
        assert!((device.hashrate_kh - 800.0).abs() < 1e-9);
        assert_eq!(device.accepted_shares, Some(5));
        assert_eq!(device.rejected_shares, Some(0));
        assert_eq!(device.temperature, 55.5);
        assert_eq!(device.power, 12.5);
        assert_eq!(device.valid, Some(4));
        assert_eq!(device.uptime_formatted(), "1h 0m");
    }

    #[test]
    fn test_falls_back_to_source_address() {
        let device = normalize(br#"{"HashRate": "1K"}"#, Some("10.1.2.3"), None).unwrap();
        assert_eq!(device.id, "10.1.2.3");
        assert_eq!(device.name, "Miner-3");

        let device = normalize(br#"{"ip": "", "HashRate": "1K"}"#, Some("10.1.2.4"), None).unwrap();
        assert_eq!(device.id, "10.1.2.4");
    }

    #[test]
    fn test_missing_address_fails() {
        let result = normalize(br#"{"HashRate": "1K"}"#, None, None);
        assert!(matches!(result, Err(NormalizeError::MissingAddress)));

        let result = normalize(br#"{"HashRate": "1K"}"#, Some("  "), None);
        assert!(matches!(result, Err(NormalizeError::MissingAddress)));
    }

    #[test]
    fn test_non_json_is_silently_rejected() {
        let err = normalize(b"DISCOVER", Some("10.0.0.1"), None).unwrap_err();
        assert!(err.is_silent());
    }

    #[test]
    fn test_custom_name_wins_unconditionally() {
        let json = r#"{"ip": "10.0.0.5", "name": "from-payload"}"#;
        let device = normalize(json.as_bytes(), None, Some("Rig-A")).unwrap();

        assert_eq!(device.display_name, "Rig-A");
        assert_eq!(device.custom_name.as_deref(), Some("Rig-A"));
        assert_eq!(device.name, "from-payload");
    }

    #[test]
    fn test_bad_fields_degrade_to_defaults() {
        let json = r#"{"ip": "10.0.0.8", "Temp": "hot", "Power": [1], "FreeHeap": "lots",
                       "HashRate": "fast", "Share": "a/b", "RSSI": "weak"}"#;
        let device = normalize(json.as_bytes(), None, None).unwrap();

        assert_eq!(device.temperature, 0.0);
        assert_eq!(device.power, 0.0);
        assert_eq!(device.free_heap, None);
        assert_eq!(device.hashrate_kh, 0.0);
        assert_eq!(device.accepted_shares, None);
        assert_eq!(device.rejected_shares, None);
        assert_eq!(device.rssi, None);
        assert_eq!(device.share.as_deref(), Some("a/b"));
    }

    #[test]
    fn test_address_without_dots_names_whole_id() {
        let device = normalize(br#"{"ip": "miner-host"}"#, None, None).unwrap();
        assert_eq!(device.name, "Miner-miner-host");
    }

    #[test]
    fn test_resolve_address_prefers_payload() {
        let payload = Payload::parse(br#"{"ip": "10.0.0.1"}"#).unwrap();
        assert_eq!(
            resolve_address(&payload, Some("10.0.0.2")),
            Some("10.0.0.1".to_string())
        );

        let payload = Payload::parse(br#"{}"#).unwrap();
        assert_eq!(
            resolve_address(&payload, Some("10.0.0.2")),
            Some("10.0.0.2".to_string())
        );
    }
}
