//! Request shapes for the static-map rendering API.
//!
//! The rendering service accepts a JSON body that embeds the GeoJSON document
//! next to the output dimensions and camera parameters. Optional members are
//! left out of the body entirely rather than sent as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `POST /v1/staticmap` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticMapRequest {
    pub geojson: Value,
    pub width: u32,
    pub height: u32,
    pub scale_factor: u8,
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_customization: Option<Vec<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> StaticMapRequest {
        StaticMapRequest {
            geojson: json!({"type": "FeatureCollection", "features": []}),
            width: 800,
            height: 600,
            scale_factor: 1,
            style: "osm-carto".to_string(),
            bearing: None,
            pitch: None,
            zoom: None,
            style_customization: None,
        }
    }

    #[test]
    fn optional_members_are_omitted() {
        let body = serde_json::to_value(request()).expect("serialize");
        let object = body.as_object().expect("object body");

        assert_eq!(object["width"], json!(800));
        assert_eq!(object["height"], json!(600));
        assert_eq!(object["scaleFactor"], json!(1));
        assert!(!object.contains_key("bearing"));
        assert!(!object.contains_key("pitch"));
        assert!(!object.contains_key("zoom"));
        assert!(!object.contains_key("styleCustomization"));
    }

    #[test]
    fn camera_and_customization_use_wire_names() {
        let mut req = request();
        req.zoom = Some(10.5);
        req.bearing = Some(163.0);
        req.style_customization = Some(vec![json!({"layer": "water", "color": "#1e90ff"})]);

        let body = serde_json::to_value(req).expect("serialize");
        assert_eq!(body["zoom"], json!(10.5));
        assert_eq!(body["bearing"], json!(163.0));
        assert_eq!(body["styleCustomization"][0]["layer"], json!("water"));
    }
}
