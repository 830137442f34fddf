//! Still-image survey mapping
//!
//! DJI stills carry their position in an XMP packet under the `drone-dji`
//! namespace. Each image of a survey folder becomes one projected point, and
//! the points are written as a GeoJSON FeatureCollection.

use crate::error::{Result, SyncError};
use crate::geodesy::Projection;
use crate::types::{SurveyPoint, XmpMetadata};
use log::{debug, info};
use regex::Regex;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::OnceLock;

const XMP_START: &[u8] = b"<x:xmpmeta";
const XMP_END: &[u8] = b"</x:xmpmeta>";

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Cut the `<x:xmpmeta>...</x:xmpmeta>` packet out of raw JPEG bytes
pub fn extract_xmp_packet(data: &[u8]) -> Option<String> {
    let start = find_bytes(data, XMP_START)?;
    let end = start + find_bytes(&data[start..], XMP_END)? + XMP_END.len();
    Some(String::from_utf8_lossy(&data[start..end]).into_owned())
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"drone-dji:(\w+)\s*=\s*"([^"]*)""#)
            .expect("XMP attribute pattern is a valid regex")
    })
}

fn element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<drone-dji:(\w+)>\s*([^<]*?)\s*</drone-dji:\w+>")
            .expect("XMP element pattern is a valid regex")
    })
}

/// Value of a `drone-dji:` tag, in attribute (`Tag="v"`) or element (`<Tag>v</Tag>`) form
pub fn dji_tag(xmp: &str, tag: &str) -> Option<String> {
    let attribute = attribute_pattern()
        .captures_iter(xmp)
        .find(|caps| &caps[1] == tag)
        .map(|caps| caps[2].trim().to_string());
    attribute.or_else(|| {
        element_pattern()
            .captures_iter(xmp)
            .find(|caps| &caps[1] == tag)
            .map(|caps| caps[2].to_string())
    })
}

fn dji_number(xmp: &str, tag: &'static str) -> Result<f64> {
    let raw = dji_tag(xmp, tag).ok_or_else(|| SyncError::format("XMP tag", tag))?;
    raw.parse::<f64>()
        .map_err(|_| SyncError::format("XMP number", raw))
}

/// Parse the position tags out of an XMP packet
pub fn parse_xmp_metadata(xmp: &str) -> Result<XmpMetadata> {
    Ok(XmpMetadata {
        latitude: dji_number(xmp, "GpsLatitude")?,
        longitude: dji_number(xmp, "GpsLongitude")?,
        absolute_altitude: dji_number(xmp, "AbsoluteAltitude").ok(),
        relative_altitude: dji_number(xmp, "RelativeAltitude")?,
    })
}

/// Read the XMP position data of a DJI still image
pub fn read_xmp_metadata(image_path: &Path) -> Result<XmpMetadata> {
    if !image_path.is_file() {
        return Err(SyncError::NotFound(image_path.to_path_buf()));
    }
    let data = std::fs::read(image_path)?;
    let xmp = extract_xmp_packet(&data)
        .ok_or_else(|| SyncError::format("XMP packet", image_path.display().to_string()))?;
    parse_xmp_metadata(&xmp)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_ascii_lowercase();
            ext_lower == "jpg" || ext_lower == "jpeg"
        })
        .unwrap_or(false)
}

/// Project every JPEG in `survey_dir`, sorted by file name
pub fn survey_to_points(survey_dir: &Path, projection: Projection) -> Result<Vec<SurveyPoint>> {
    if !survey_dir.is_dir() {
        return Err(SyncError::NotFound(survey_dir.to_path_buf()));
    }

    let mut images: Vec<_> = std::fs::read_dir(survey_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_jpeg(path))
        .collect();
    images.sort();

    let projector = projection.projector()?;
    let mut points = Vec::with_capacity(images.len());
    for image in images {
        let metadata = read_xmp_metadata(&image)?;
        let (x, y) = projector.project(metadata.longitude, metadata.latitude)?;
        let filename = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        debug!("{}: ({:.3}, {:.3}) h={}", filename, x, y, metadata.relative_altitude);
        points.push(SurveyPoint {
            filename,
            x,
            y,
            flight_height: metadata.relative_altitude,
        });
    }

    info!("Mapped {} survey images from {:?}", points.len(), survey_dir);
    Ok(points)
}

/// GeoJSON FeatureCollection for survey points, tagged with a named CRS
pub fn survey_feature_collection(points: &[SurveyPoint], projection: Projection) -> Value {
    let features: Vec<Value> = points
        .iter()
        .map(|point| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [point.x, point.y] },
                "properties": {
                    "filename": point.filename,
                    "height": point.flight_height,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "crs": {
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", projection.epsg_code()) },
        },
        "features": features,
    })
}

/// Write survey points as GeoJSON
pub fn export_survey_geojson(
    points: &[SurveyPoint],
    projection: Projection,
    output_path: &Path,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(&survey_feature_collection(points, projection))
        .map_err(|e| SyncError::Export(format!("Failed to serialize survey: {}", e)))?;
    std::fs::write(output_path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XMP_ATTRIBUTES: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:Description
   drone-dji:AbsoluteAltitude="+712.35"
   drone-dji:RelativeAltitude="+60.10"
   drone-dji:GpsLatitude="53.408144"
   drone-dji:GpsLongitude="-113.980656"
   drone-dji:GimbalRollDegree="+0.00"/></x:xmpmeta>"#;

    #[test]
    fn test_extract_packet_from_jpeg_bytes() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10];
        data.extend_from_slice(XMP_ATTRIBUTES.as_bytes());
        data.extend_from_slice(&[0xFF, 0xD9]);
        let packet = extract_xmp_packet(&data).unwrap();
        assert!(packet.starts_with("<x:xmpmeta"));
        assert!(packet.ends_with("</x:xmpmeta>"));
    }

    #[test]
    fn test_parse_attribute_form() {
        let meta = parse_xmp_metadata(XMP_ATTRIBUTES).unwrap();
        assert_eq!(meta.latitude, 53.408144);
        assert_eq!(meta.longitude, -113.980656);
        assert_eq!(meta.relative_altitude, 60.10);
        assert_eq!(meta.absolute_altitude, Some(712.35));
    }

    #[test]
    fn test_parse_element_form() {
        let xmp = "<x:xmpmeta><drone-dji:GpsLatitude>10.5</drone-dji:GpsLatitude>\
                   <drone-dji:GpsLongitude> -20.25 </drone-dji:GpsLongitude>\
                   <drone-dji:RelativeAltitude>30</drone-dji:RelativeAltitude></x:xmpmeta>";
        let meta = parse_xmp_metadata(xmp).unwrap();
        assert_eq!((meta.latitude, meta.longitude), (10.5, -20.25));
        assert_eq!(meta.absolute_altitude, None);
    }

    #[test]
    fn test_tag_lookup_matches_whole_names() {
        let xmp = r#"<x:xmpmeta drone-dji:GpsLatitudeRef="N" drone-dji:GpsLatitude="1.5"
            drone-dji:GpsLongitude="2.5" drone-dji:RelativeAltitude="3"></x:xmpmeta>"#;
        assert_eq!(dji_tag(xmp, "GpsLatitude").as_deref(), Some("1.5"));
        assert_eq!(dji_tag(xmp, "GpsLatitudeRef").as_deref(), Some("N"));
        assert_eq!(dji_tag(xmp, "GpsAltitude"), None);
    }

    #[test]
    fn test_patterns_are_compiled_once() {
        assert!(std::ptr::eq(attribute_pattern(), attribute_pattern()));
        assert!(std::ptr::eq(element_pattern(), element_pattern()));
    }

    #[test]
    fn test_missing_tag_is_format_error() {
        let xmp = r#"<x:xmpmeta drone-dji:GpsLatitude="1.0"></x:xmpmeta>"#;
        assert!(matches!(
            parse_xmp_metadata(xmp),
            Err(SyncError::Format { kind: "XMP tag", .. })
        ));
    }

    #[test]
    fn test_feature_collection_names_crs() {
        let points = vec![SurveyPoint {
            filename: "DJI_0001.JPG".to_string(),
            x: 1.0,
            y: 2.0,
            flight_height: 60.0,
        }];
        let fc = survey_feature_collection(&points, Projection::Utm { zone: 15, north: true });
        assert_eq!(fc["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::32615");
        assert_eq!(fc["features"][0]["geometry"]["coordinates"][1], 2.0);
        assert_eq!(fc["features"][0]["properties"]["filename"], "DJI_0001.JPG");
    }
}
