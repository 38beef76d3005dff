// export.rs — hotspots.json 的读写
//
// 导出时始终写入世界坐标 position（6 位小数）；原始 uv / d 原样保留，
// 只有世界锚定的热点才通过 projection::inverse 反推。

use crate::error::{Result, ViewerError};
use crate::hotspot::{Anchor, Hotspot, HotspotKind, HotspotSet};
use crate::projection::{inverse, DepthParams};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const EXPORT_DECIMALS: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotType {
    Link,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: HotspotType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

impl HotspotRecord {
    /// UV + depth wins over `position` when a record carries both.
    pub fn into_hotspot(self, params: &DepthParams) -> std::result::Result<Hotspot, String> {
        let anchor = match (self.uv, self.d, self.position) {
            (Some([u, v]), Some(d), _) => Anchor::authored(u, v, d, params),
            (_, _, Some([x, y, z])) => Anchor::World {
                position: Vec3::new(x as f32, y as f32, z as f32),
            },
            _ => return Err("neither `position` nor `uv` + `d` present".to_string()),
        };

        let kind = match self.kind {
            HotspotType::Link => match self.target {
                Some(target) if !target.is_empty() => HotspotKind::Link { target },
                _ => return Err("link without `target`".to_string()),
            },
            HotspotType::Info => HotspotKind::Info {
                content: self.content.unwrap_or_default(),
            },
        };

        Ok(Hotspot {
            id: self.id,
            title: self.title,
            kind,
            anchor,
        })
    }

    pub fn from_hotspot(hotspot: &Hotspot, params: &DepthParams) -> Self {
        let p = hotspot.position();
        let position = [p.x, p.y, p.z].map(|c| round_to(c as f64, EXPORT_DECIMALS));

        let (uv, d) = match &hotspot.anchor {
            Anchor::Uv {
                authored: [u, v, d],
                ..
            } => ([*u, *v], *d),
            Anchor::World { position } => {
                let derived = inverse(*position, params);
                (
                    [derived.u, derived.v].map(|c| round_to(c as f64, EXPORT_DECIMALS)),
                    round_to(derived.d as f64, EXPORT_DECIMALS),
                )
            }
        };

        let (kind, target, content) = match &hotspot.kind {
            HotspotKind::Link { target } => (HotspotType::Link, Some(target.clone()), None),
            HotspotKind::Info { content } => (HotspotType::Info, None, Some(content.clone())),
        };

        Self {
            id: hotspot.id.clone(),
            title: hotspot.title.clone(),
            kind,
            target,
            content,
            position: Some(position),
            uv: Some(uv),
            d: Some(d),
        }
    }
}

/// Hotspots that parsed, plus one warning per skipped record.
#[derive(Debug, Default)]
pub struct ParsedHotspots {
    pub hotspots: Vec<Hotspot>,
    pub skipped: Vec<ViewerError>,
}

/// Parses a hotspot list. A bad record is skipped; only a document that is not
/// a JSON array fails as a whole.
pub fn parse_hotspot_list(text: &str, params: &DepthParams) -> Result<ParsedHotspots> {
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
    let mut parsed = ParsedHotspots::default();

    for (index, value) in values.into_iter().enumerate() {
        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("?")
            .to_string();

        let result = serde_json::from_value::<HotspotRecord>(value)
            .map_err(|e| e.to_string())
            .and_then(|record| record.into_hotspot(params));

        match result {
            Ok(hotspot) => parsed.hotspots.push(hotspot),
            Err(reason) => {
                let err = ViewerError::MalformedHotspot { index, id, reason };
                log::warn!("{}", err);
                parsed.skipped.push(err);
            }
        }
    }

    Ok(parsed)
}

pub fn export_records(hotspots: &HotspotSet, params: &DepthParams) -> Vec<HotspotRecord> {
    hotspots
        .iter()
        .map(|h| HotspotRecord::from_hotspot(h, params))
        .collect()
}

pub fn export_json(hotspots: &HotspotSet, params: &DepthParams) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_records(hotspots, params))?)
}

pub fn write_export(path: &Path, hotspots: &HotspotSet, params: &DepthParams) -> Result<()> {
    let json = export_json(hotspots, params)?;
    std::fs::write(path, json)?;
    log::info!("exported {} hotspots to {}", hotspots.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::SurfaceUv;

    fn params() -> DepthParams {
        DepthParams::default()
    }

    #[test]
    fn parses_uv_and_world_records() {
        let text = r#"[
            {"id":"h1","title":"Door","type":"link","target":"hall","uv":[0.5,0.5],"d":0.6},
            {"id":"h2","title":"Lamp","type":"info","content":"lamp","position":[1,0,0]}
        ]"#;
        let parsed = parse_hotspot_list(text, &params()).unwrap();
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.hotspots.len(), 2);

        let door = &parsed.hotspots[0];
        assert!(matches!(&door.kind, HotspotKind::Link { target } if target == "hall"));
        assert!(door.position().distance(Vec3::new(0.0, 0.0, 2.8)) < 1e-5);

        let lamp = &parsed.hotspots[1];
        assert!(matches!(lamp.anchor, Anchor::World { position } if position == Vec3::X));
    }

    #[test]
    fn malformed_records_are_skipped_individually() {
        let text = r#"[
            {"id":"bad","title":"No anchor","type":"info","content":"x"},
            {"id":"worse","type":"portal","position":[0,0,1]},
            {"id":"ok","title":"Fine","type":"info","content":"y","uv":[0.1,0.2],"d":0.3}
        ]"#;
        let parsed = parse_hotspot_list(text, &params()).unwrap();
        assert_eq!(parsed.hotspots.len(), 1);
        assert_eq!(parsed.hotspots[0].id, "ok");
        assert_eq!(parsed.skipped.len(), 2);
        assert!(matches!(
            &parsed.skipped[0],
            ViewerError::MalformedHotspot { index: 0, id, .. } if id == "bad"
        ));
    }

    #[test]
    fn non_array_document_fails() {
        assert!(parse_hotspot_list(r#"{"id":"h1"}"#, &params()).is_err());
    }

    #[test]
    fn world_anchored_export_derives_uv_through_inverse() {
        let set = HotspotSet::new(vec![Hotspot {
            id: "w".into(),
            title: "W".into(),
            kind: HotspotKind::Info {
                content: String::new(),
            },
            anchor: Anchor::World {
                position: Vec3::new(1.0, 0.0, 0.0),
            },
        }]);
        let records = export_records(&set, &params());
        let r = &records[0];
        assert_eq!(r.position, Some([1.0, 0.0, 0.0]));
        assert_eq!(r.uv, Some([0.75, 0.5]));
        assert_eq!(r.d, Some(0.0));
    }

    #[test]
    fn uv_anchored_export_preserves_authored_values() {
        let set = HotspotSet::new(vec![Hotspot {
            id: "u".into(),
            title: "U".into(),
            kind: HotspotKind::Link {
                target: "hall".into(),
            },
            anchor: Anchor::authored(0.25, 0.75, 0.4, &params()),
        }]);
        let r = &export_records(&set, &params())[0];
        assert_eq!(r.uv, Some([0.25, 0.75]));
        assert_eq!(r.d, Some(0.4));
        assert_eq!(r.target.as_deref(), Some("hall"));
        assert!(r.content.is_none());

        let p = r.position.unwrap();
        for c in p {
            assert_eq!(c, round_to(c, EXPORT_DECIMALS));
        }
    }

    #[test]
    fn exported_json_reimports_as_uv_anchored() {
        let set = HotspotSet::new(vec![Hotspot {
            id: "u".into(),
            title: "U".into(),
            kind: HotspotKind::Info {
                content: "text".into(),
            },
            anchor: Anchor::uv(SurfaceUv::new(0.3, 0.6, 0.2), &params()),
        }]);
        let json = export_json(&set, &params()).unwrap();
        assert!(json.contains("\"type\": \"info\""));
        let parsed = parse_hotspot_list(&json, &params()).unwrap();
        assert!(matches!(parsed.hotspots[0].anchor, Anchor::Uv { .. }));
    }

    #[test]
    fn decimal_uv_and_depth_survive_import_and_export() {
        let text = r#"[{"id":"u","title":"U","type":"info","content":"","uv":[0.3,0.6],"d":0.7}]"#;
        let parsed = parse_hotspot_list(text, &params()).unwrap();
        let json = export_json(&HotspotSet::new(parsed.hotspots), &params()).unwrap();

        let records: Vec<HotspotRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(records[0].uv, Some([0.3, 0.6]));
        assert_eq!(records[0].d, Some(0.7));
    }

    #[test]
    fn link_without_target_is_skipped() {
        let text = r#"[
            {"id":"a","title":"Nowhere","type":"link","uv":[0.5,0.5],"d":0.5},
            {"id":"b","title":"Empty","type":"link","target":"","uv":[0.5,0.5],"d":0.5},
            {"id":"c","title":"Hall","type":"link","target":"hall","uv":[0.5,0.5],"d":0.5}
        ]"#;
        let parsed = parse_hotspot_list(text, &params()).unwrap();
        assert_eq!(parsed.hotspots.len(), 1);
        assert_eq!(parsed.hotspots[0].id, "c");
        assert!(matches!(
            &parsed.skipped[0],
            ViewerError::MalformedHotspot { index: 0, reason, .. } if reason.contains("target")
        ));
    }
}
