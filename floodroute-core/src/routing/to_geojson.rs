use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::alternatives::{AlternativeSet, LabeledRoute};
use super::route::Route;
use crate::Error;
use crate::geometry::Coordinate;

fn line_geometry(coordinates: &[Coordinate]) -> Geometry {
    Geometry::new(GeoJsonValue::LineString(
        coordinates.iter().map(|c| vec![c.lon, c.lat]).collect(),
    ))
}

impl Route {
    /// The route as a single `LineString` feature
    pub fn to_feature(&self) -> Result<Feature, Error> {
        let value = json!({
            "type": "Feature",
            "geometry": line_geometry(&self.coordinates),
            "properties": {
                "mode": self.mode,
                "distance_m": self.distance_m,
                "duration_s": self.duration_s,
                "cost": self.cost,
                "flooded_distance_m": self.flooded_distance_m(),
                "segments": self.segments,
                "terrain": self.terrain_summary(),
            }
        });
        Ok(Feature::from_json_value(value)?)
    }

    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        Ok(FeatureCollection {
            features: vec![self.to_feature()?],
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.to_geojson()?)?)
    }
}

impl LabeledRoute {
    /// Route feature extended with its label and flood assessment
    pub fn to_feature(&self) -> Result<Feature, Error> {
        let value = json!({
            "type": "Feature",
            "geometry": line_geometry(&self.route.coordinates),
            "properties": {
                "label": self.label,
                "source": self.source,
                "duplicate": self.duplicate,
                "mode": self.route.mode,
                "distance_m": self.route.distance_m,
                "duration_s": self.route.duration_s,
                "flooded_percentage": self.risk.flooded_percentage,
                "flooded_distance_m": self.risk.flooded_distance_m,
                "risk_level": self.risk.risk_level,
                "weather_multiplier": self.risk.weather_impact.multiplier,
                "segments": self.route.segments,
                "points": self.risk.points,
            }
        });
        Ok(Feature::from_json_value(value)?)
    }
}

impl AlternativeSet {
    /// One feature per labelled route, safest first
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .routes
            .iter()
            .map(LabeledRoute::to_feature)
            .collect::<Result<Vec<_>, _>>()?;
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("degenerate".to_string(), json!(self.degenerate));
        foreign_members.insert(
            "candidates_considered".to_string(),
            json!(self.candidates_considered),
        );
        foreign_members.insert("weather".to_string(), json!(self.weather_impact));
        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: Some(foreign_members),
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.to_geojson()?)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::cost::{CostModel, TravelMode};
    use crate::geometry::Coordinate;
    use crate::loading::{EngineConfig, build_network};
    use crate::model::RoadSegment;
    use crate::routing::planner::{RoutePlanner, RouteRequest};

    #[test]
    fn route_feature_is_lon_lat_line() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.001);
        let segments = vec![RoadSegment::new("ab", vec![a, b]).with_name("Main")];
        let network = build_network(segments, 6, CostModel::default()).0;
        let config = EngineConfig::default();
        let planner = RoutePlanner::new(&network, &config);
        let route = planner
            .route(&RouteRequest::new(a, b).with_mode(TravelMode::Walking))
            .unwrap()
            .into_route()
            .unwrap();

        let collection = route.to_geojson().unwrap();
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        let Some(geojson::Value::LineString(line)) = feature.geometry.as_ref().map(|g| &g.value)
        else {
            panic!("expected a line string");
        };
        assert_eq!(line.first().unwrap(), &vec![0.0, 0.0]);
        assert_eq!(line.last().unwrap(), &vec![0.001, 0.0]);
        assert_eq!(
            feature.property("mode").and_then(|v| v.as_str()),
            Some("walking")
        );

        let text = route.to_geojson_string().unwrap();
        assert!(text.contains("\"Main\""));
    }
}
