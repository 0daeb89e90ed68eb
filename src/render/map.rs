use crate::domain::model::ProjectPoint;
use crate::utils::format::{fmt_int, fmt_money, fmt_pct, snip_url};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde::Serialize;

/// Markers drawn at most; the caption still reports the full count.
pub const MAX_MAP_MARKERS: usize = 5000;
const NAME_PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub snip_id: i64,
    pub snip_url: String,
    pub name: String,
    pub location: String,
    pub audit_status: String,
    pub current_budget: String,
    pub execution: String,
    pub inconsistent: bool,
    pub latitude: f64,
    pub longitude: f64,
}

impl MapMarker {
    /// `None` for points without coordinates.
    pub fn from_point(point: &ProjectPoint) -> Option<Self> {
        let (latitude, longitude) = point.coordinates()?;
        let name: String = point
            .name
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(NAME_PREVIEW_CHARS)
            .collect();

        Some(Self {
            snip_id: point.snip_id,
            snip_url: snip_url(point.snip_id),
            name,
            location: format!(
                "{} / {}",
                point.department.as_deref().unwrap_or(""),
                point.municipality.as_deref().unwrap_or("")
            ),
            audit_status: point.audit_status.clone().unwrap_or_default(),
            current_budget: fmt_money(point.current_budget, 2),
            execution: fmt_pct(point.execution_ratio, 1),
            inconsistent: point.is_inconsistent(),
            latitude,
            longitude,
        })
    }

    fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("snip".to_string(), self.snip_id.into());
        properties.insert("snip_url".to_string(), self.snip_url.clone().into());
        properties.insert("name".to_string(), self.name.clone().into());
        properties.insert("location".to_string(), self.location.clone().into());
        properties.insert("audit_status".to_string(), self.audit_status.clone().into());
        properties.insert("current_budget".to_string(), self.current_budget.clone().into());
        properties.insert("execution".to_string(), self.execution.clone().into());
        properties.insert("inconsistent".to_string(), self.inconsistent.into());

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![self.longitude, self.latitude]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub title: String,
    /// Points matching the filter, before the marker cap.
    pub total_points: usize,
    /// `[latitude, longitude]` medians over every matching point.
    pub center: Option<[f64; 2]>,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Builds the marker layer from already filtered points. Only the first
    /// [`MAX_MAP_MARKERS`] are kept, in the order given.
    pub fn build(title: &str, points: &[&ProjectPoint]) -> Self {
        let located: Vec<(&ProjectPoint, (f64, f64))> = points
            .iter()
            .filter_map(|p| p.coordinates().map(|c| (*p, c)))
            .collect();

        let center = match (
            median(located.iter().map(|(_, (lat, _))| *lat).collect()),
            median(located.iter().map(|(_, (_, lon))| *lon).collect()),
        ) {
            (Some(lat), Some(lon)) => Some([lat, lon]),
            _ => None,
        };

        let markers = located
            .iter()
            .take(MAX_MAP_MARKERS)
            .filter_map(|(p, _)| MapMarker::from_point(p))
            .collect();

        Self {
            title: title.to_string(),
            total_points: located.len(),
            center,
            markers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_points == 0
    }

    pub fn shown_points(&self) -> usize {
        self.markers.len()
    }

    pub fn caption(&self) -> String {
        if self.is_empty() {
            return "No points for the current filter.".to_string();
        }
        format!(
            "Points: {} (showing up to {})",
            fmt_int(Some(self.total_points as f64)),
            fmt_int(Some(self.shown_points() as f64))
        )
    }

    pub fn to_geojson(&self) -> GeoJson {
        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features: self.markers.iter().map(MapMarker::to_feature).collect(),
            foreign_members: None,
        })
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
