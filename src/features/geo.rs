//! Geospatial proximity search over course locations
//!
//! Locations are GeoJSON points (`{type: Point, coordinates: [lon, lat]}`).
//! Distances are great-circle distances on a sphere of radius
//! [`EARTH_RADIUS_M`].

use crate::entities::{Course, Entity};
use crate::error::{Error, Result};
use crate::query::filter::Filter;
use crate::reports::round2;
use crate::schema::catalog::COURSES;
use crate::storage::document::Value;
use crate::Database;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean earth radius used for spherical distances, in metres
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Build a point, rejecting out-of-range coordinates
    pub fn checked(longitude: f64, latitude: f64) -> Result<Self> {
        let point = Self::new(longitude, latitude);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(Error::InvalidArgument {
                message: format!(
                    "coordinates ({}, {}) are outside longitude [-180, 180] / latitude [-90, 90]",
                    longitude, latitude
                ),
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Read a GeoJSON point
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.get("type")?.as_str()? != "Point" {
            return None;
        }
        match obj.get("coordinates")?.as_array()?.as_slice() {
            [lon, lat] => {
                let point = Self::new(lon.as_f64()?, lat.as_f64()?);
                point.is_valid().then_some(point)
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("type".to_string(), Value::from("Point"));
        map.insert(
            "coordinates".to_string(),
            Value::Array(vec![Value::Float(self.longitude), Value::Float(self.latitude)]),
        );
        Value::Object(map)
    }

    /// Haversine distance in metres
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

/// A course within range of the search point
#[derive(Debug, Clone, Serialize)]
pub struct NearbyCourse {
    pub course_id: String,
    pub title: String,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price: Option<f64>,
    pub location: GeoPoint,
    /// Rounded to 2 decimals
    pub distance_km: f64,
}

/// Published courses within `max_distance_km` of a point, nearest first
pub async fn courses_near(
    db: &Database,
    longitude: f64,
    latitude: f64,
    max_distance_km: f64,
) -> Result<Vec<NearbyCourse>> {
    let origin = GeoPoint::checked(longitude, latitude)?;
    if !(max_distance_km.is_finite() && max_distance_km >= 0.0) {
        return Err(Error::InvalidArgument {
            message: format!("search radius must be a non-negative number, got {}", max_distance_km),
        });
    }
    let max_distance_m = max_distance_km * 1000.0;

    let published = Filter::eq("is_published", true).and(Filter::exists("location"));
    let mut hits: Vec<(f64, NearbyCourse)> = Vec::new();

    for doc in db.find(COURSES, &published).await? {
        let course = Course::from_document(&doc)?;
        let Some(location) = course.location else {
            continue;
        };
        let distance_m = origin.distance_m(&location);
        if distance_m > max_distance_m {
            continue;
        }
        hits.push((
            distance_m,
            NearbyCourse {
                course_id: course.id,
                title: course.title,
                category: course.category,
                level: course.level.map(|l| l.to_string()),
                price: course.price,
                location,
                distance_km: round2(distance_m / 1000.0),
            },
        ));
    }

    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    tracing::debug!("{} courses within {} km of {:?}", hits.len(), max_distance_km, origin);
    Ok(hits.into_iter().map(|(_, c)| c).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{courses, users};
    use tempfile::TempDir;

    const NYC: GeoPoint = GeoPoint {
        longitude: -74.0060,
        latitude: 40.7128,
    };
    const LONDON: GeoPoint = GeoPoint {
        longitude: -0.1278,
        latitude: 51.5074,
    };
    const PARIS: GeoPoint = GeoPoint {
        longitude: 2.3522,
        latitude: 48.8566,
    };

    #[test]
    fn test_haversine_distances() {
        assert_eq!(NYC.distance_m(&NYC), 0.0);

        let london_paris = LONDON.distance_m(&PARIS) / 1000.0;
        assert!((340.0..=350.0).contains(&london_paris), "{}", london_paris);

        let nyc_london = NYC.distance_m(&LONDON) / 1000.0;
        assert!((5550.0..=5600.0).contains(&nyc_london), "{}", nyc_london);
    }

    #[test]
    fn test_geojson_value() {
        let value = LONDON.to_value();
        assert_eq!(GeoPoint::from_value(&value), Some(LONDON));

        let mut bad = value.as_object().unwrap().clone();
        bad.insert("type".into(), Value::from("Polygon"));
        assert_eq!(GeoPoint::from_value(&Value::Object(bad)), None);

        assert!(GeoPoint::checked(200.0, 0.0).is_err());
        assert!(GeoPoint::from_value(&GeoPoint::new(0.0, 95.0).to_value()).is_none());
    }

    #[tokio::test]
    async fn test_courses_near_orders_published_courses() {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(tmp.path()).await.unwrap();
        db.apply_validators().await.unwrap();
        let tutor = users::add_instructor(&db, users::NewUser::new("teach", "t@example.com", "h"))
            .await
            .unwrap();

        // Points on the equator east of the origin, in degrees of longitude
        let mut ids = std::collections::HashMap::new();
        for (title, lon, published) in [
            ("Course at 0.40", 0.40, true),
            ("Course at 0.10", 0.10, true),
            ("Course at 0.05", 0.05, false),
            ("Course at 0.25", 0.25, true),
            ("Course at 1.00", 1.00, true),
        ] {
            let course = courses::create(
                &db,
                courses::NewCourse::new(title, "A course description long enough.", &tutor.id),
            )
            .await
            .unwrap();
            courses::set_location(&db, &course.id, lon, 0.0).await.unwrap();
            if !published {
                courses::set_published(&db, &course.id, false).await.unwrap();
            }
            ids.insert(title, course.id);
        }

        let near = courses_near(&db, 0.0, 0.0, 50.0).await.unwrap();
        let titles: Vec<&str> = near.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Course at 0.10", "Course at 0.25", "Course at 0.40"]);
        let distances: Vec<f64> = near.iter().map(|c| c.distance_km).collect();
        assert_eq!(distances, vec![11.13, 27.83, 44.53]);
        assert_eq!(near[0].course_id, ids["Course at 0.10"]);

        assert!(courses_near(&db, 0.0, 0.0, -1.0).await.unwrap_err().is_validation());
        assert!(courses_near(&db, 0.0, 91.0, 10.0).await.unwrap_err().is_validation());
    }
}
