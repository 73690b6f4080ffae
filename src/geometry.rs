//! Geometria gmin: punkt reprezentatywny (do "przelotu" kamery) i zasięgi.
//!
//! Pierścienie są zamknięte (pierwszy wierzchołek powtórzony na końcu),
//! tak jak w GeoJSON. Ani pole, ani centroid nie domykają pierścienia same.

use geo::{Coord, CoordsIter, Geometry, LineString, MultiPolygon, Polygon, Rect};

use crate::error::AtlasError;

/// Geometria obiektu rozróżniona po rodzaju.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Other(Geometry<f64>),
}

impl From<Geometry<f64>> for FeatureGeometry {
    fn from(geometry: Geometry<f64>) -> Self {
        match geometry {
            Geometry::Polygon(p) => FeatureGeometry::Polygon(p),
            Geometry::MultiPolygon(m) => FeatureGeometry::MultiPolygon(m),
            other => FeatureGeometry::Other(other),
        }
    }
}

impl FeatureGeometry {
    /// Wielokąty do rysowania; inne rodzaje geometrii nie mają obrysu.
    pub fn polygons(&self) -> Option<MultiPolygon<f64>> {
        match self {
            FeatureGeometry::Polygon(p) => Some(p.clone().into()),
            FeatureGeometry::MultiPolygon(m) => Some(m.clone()),
            FeatureGeometry::Other(_) => None,
        }
    }
}

/// Średnia arytmetyczna wierzchołków pierścienia.
///
/// To nie jest centroid ważony polem, tylko przybliżenie wystarczające do
/// wycentrowania mapy. Dla nieregularnych kształtów punkt może wypaść
/// poza wielokątem.
pub fn polygon_centroid(ring: &[Coord<f64>]) -> Result<Coord<f64>, AtlasError> {
    if ring.is_empty() {
        return Err(AtlasError::InvalidGeometry("pusty pierścień".into()));
    }
    let (sum_lon, sum_lat) = ring
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
    let count = ring.len() as f64;
    Ok(Coord { x: sum_lon / count, y: sum_lat / count })
}

/// Pole wzorem shoelace'a po kolejnych parach wierzchołków.
///
/// Ostatni wierzchołek nie jest łączony z pierwszym, więc wynik jest poprawny
/// tylko dla pierścienia zamkniętego.
pub fn polygon_signed_area(ring: &[Coord<f64>]) -> f64 {
    let mut sum = 0.0;
    for window in ring.windows(2) {
        let a = window[0];
        let b = window[1];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Punkt, do którego leci kamera po wybraniu gminy.
pub fn geometry_centroid(geometry: &FeatureGeometry) -> Result<Coord<f64>, AtlasError> {
    match geometry {
        FeatureGeometry::Polygon(p) => polygon_centroid(&p.exterior().0),
        FeatureGeometry::MultiPolygon(mp) => {
            let mut parts = mp.0.iter();
            let first = parts
                .next()
                .ok_or_else(|| AtlasError::InvalidGeometry("pusty MultiPolygon".into()))?;
            let mut largest = first.exterior();
            let mut largest_area = polygon_signed_area(&largest.0).abs();
            // Remis wygrywa pierwszy napotkany wielokąt.
            for poly in parts {
                let area = polygon_signed_area(&poly.exterior().0).abs();
                if area > largest_area {
                    largest_area = area;
                    largest = poly.exterior();
                }
            }
            polygon_centroid(&largest.0)
        }
        FeatureGeometry::Other(_) => {
            let bounds = geometry_bounds(geometry)?;
            Ok(bounds.center())
        }
    }
}

/// Prostokąt ograniczający wszystkie współrzędne geometrii, łącznie z dziurami.
pub fn geometry_bounds(geometry: &FeatureGeometry) -> Result<Rect<f64>, AtlasError> {
    let bounds = match geometry {
        FeatureGeometry::Polygon(p) => polygon_bounds(p),
        FeatureGeometry::MultiPolygon(mp) => mp.0.iter().map(polygon_bounds).fold(None, merge),
        FeatureGeometry::Other(g) => coords_bounds(g.coords_iter()),
    };
    bounds.ok_or_else(|| AtlasError::InvalidGeometry("brak współrzędnych".into()))
}

/// Suma zasięgów wszystkich geometrii; używana raz, do dopasowania widoku.
pub fn feature_set_bounds<'a, I>(geometries: I) -> Result<Rect<f64>, AtlasError>
where
    I: IntoIterator<Item = &'a FeatureGeometry>,
{
    let mut total = None;
    for geometry in geometries {
        total = merge(total, Some(geometry_bounds(geometry)?));
    }
    total.ok_or(AtlasError::EmptyFeatureSet)
}

fn polygon_bounds(polygon: &Polygon<f64>) -> Option<Rect<f64>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_bounds)
        .fold(None, merge)
}

fn ring_bounds(ring: &LineString<f64>) -> Option<Rect<f64>> {
    coords_bounds(ring.0.iter().copied())
}

fn coords_bounds(coords: impl Iterator<Item = Coord<f64>>) -> Option<Rect<f64>> {
    coords.fold(None, |acc, c| merge(acc, Some(Rect::new(c, c))))
}

fn merge(a: Option<Rect<f64>>, b: Option<Rect<f64>>) -> Option<Rect<f64>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(Rect::new(
            Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        )),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, coord, polygon};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn centroid_is_plain_vertex_mean() {
        let ring = square(0.0, 0.0, 2.0).exterior().0.clone();
        let c = polygon_centroid(&ring).unwrap();
        // Zamykający wierzchołek liczy się drugi raz.
        assert_eq!(c, coord! { x: 4.0 / 5.0, y: 4.0 / 5.0 });

        let ring = vec![
            coord! { x: 1.0, y: 1.0 },
            coord! { x: 4.0, y: 1.0 },
            coord! { x: 1.0, y: 7.0 },
        ];
        assert_eq!(polygon_centroid(&ring).unwrap(), coord! { x: 2.0, y: 3.0 });
    }

    #[test]
    fn centroid_of_empty_ring_is_invalid() {
        assert!(matches!(
            polygon_centroid(&[]),
            Err(AtlasError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn signed_area_of_closed_square() {
        let ring = square(0.0, 0.0, 3.0).exterior().0.clone();
        assert_eq!(polygon_signed_area(&ring), 9.0);
        let reversed: Vec<_> = ring.iter().rev().copied().collect();
        assert_eq!(polygon_signed_area(&reversed), -9.0);
    }

    #[test]
    fn multipolygon_uses_largest_part() {
        // Pola 10 i 90.
        let small = polygon![
            (x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 5.0, y: 2.0), (x: 0.0, y: 2.0), (x: 0.0, y: 0.0),
        ];
        let large = polygon![
            (x: 10.0, y: 10.0), (x: 19.0, y: 10.0), (x: 19.0, y: 20.0), (x: 10.0, y: 20.0), (x: 10.0, y: 10.0),
        ];
        let expected = polygon_centroid(&large.exterior().0).unwrap();
        let geometry = FeatureGeometry::MultiPolygon(MultiPolygon(vec![small, large]));
        assert_eq!(geometry_centroid(&geometry).unwrap(), expected);
    }

    #[test]
    fn multipolygon_tie_keeps_first_part() {
        let first = square(0.0, 0.0, 1.0);
        let second = square(5.0, 5.0, 1.0);
        let expected = polygon_centroid(&first.exterior().0).unwrap();
        let geometry = FeatureGeometry::MultiPolygon(MultiPolygon(vec![first, second]));
        assert_eq!(geometry_centroid(&geometry).unwrap(), expected);
    }

    #[test]
    fn empty_multipolygon_is_invalid() {
        let geometry = FeatureGeometry::MultiPolygon(MultiPolygon(vec![]));
        assert!(matches!(
            geometry_centroid(&geometry),
            Err(AtlasError::InvalidGeometry(_))
        ));
        assert!(geometry_bounds(&geometry).is_err());
    }

    #[test]
    fn degenerate_point_bounds() {
        let geometry = FeatureGeometry::from(Geometry::Point(Point::new(2.3, 47.0)));
        let bounds = geometry_bounds(&geometry).unwrap();
        assert_eq!(bounds.min(), coord! { x: 2.3, y: 47.0 });
        assert_eq!(bounds.max(), coord! { x: 2.3, y: 47.0 });
        assert_eq!(geometry_centroid(&geometry).unwrap(), coord! { x: 2.3, y: 47.0 });
    }

    #[test]
    fn polygon_bounds_include_holes() {
        let polygon = Polygon::new(
            square(0.0, 0.0, 4.0).exterior().clone(),
            vec![LineString::from(vec![(1.0, 1.0), (5.0, 1.0), (1.0, -1.0), (1.0, 1.0)])],
        );
        let bounds = geometry_bounds(&FeatureGeometry::Polygon(polygon)).unwrap();
        assert_eq!(bounds.min(), coord! { x: 0.0, y: -1.0 });
        assert_eq!(bounds.max(), coord! { x: 5.0, y: 4.0 });
    }

    #[test]
    fn set_bounds_ignore_order() {
        let a = FeatureGeometry::Polygon(square(-1.0, 45.0, 0.5));
        let b = FeatureGeometry::Polygon(square(2.0, 46.0, 1.0));
        let c = FeatureGeometry::MultiPolygon(MultiPolygon(vec![square(0.0, 48.0, 0.25)]));

        let forward = feature_set_bounds([&a, &b, &c]).unwrap();
        let backward = feature_set_bounds([&c, &b, &a]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.min(), coord! { x: -1.0, y: 45.0 });
        assert_eq!(forward.max(), coord! { x: 3.0, y: 48.25 });
    }

    #[test]
    fn set_bounds_of_nothing_fail() {
        let none: Vec<FeatureGeometry> = Vec::new();
        assert!(matches!(
            feature_set_bounds(&none),
            Err(AtlasError::EmptyFeatureSet)
        ));
    }

    fn any_coord() -> impl Strategy<Value = Coord<f64>> {
        (-180.0f64..180.0, -90.0f64..90.0).prop_map(|(x, y)| coord! { x: x, y: y })
    }

    fn squares_of(specs: &[(f64, f64, f64)]) -> Vec<FeatureGeometry> {
        specs
            .iter()
            .map(|&(x, y, side)| FeatureGeometry::Polygon(square(x, y, side)))
            .collect()
    }

    proptest! {
        #[test]
        fn centroid_of_any_ring_is_vertex_mean(ring in prop::collection::vec(any_coord(), 1..64)) {
            let c = polygon_centroid(&ring).unwrap();
            let n = ring.len() as f64;
            let mean_x = ring.iter().map(|c| c.x).sum::<f64>() / n;
            let mean_y = ring.iter().map(|c| c.y).sum::<f64>() / n;
            prop_assert!((c.x - mean_x).abs() < 1e-9, "{} != {}", c.x, mean_x);
            prop_assert!((c.y - mean_y).abs() < 1e-9, "{} != {}", c.y, mean_y);
        }

        #[test]
        fn set_bounds_are_extremes_in_any_order(
            (specs, shuffled) in prop::collection::vec(
                (-180.0f64..179.0, -90.0f64..89.0, 0.001f64..1.0),
                1..24,
            )
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let bounds = feature_set_bounds(&squares_of(&specs)).unwrap();
            prop_assert_eq!(bounds, feature_set_bounds(&squares_of(&shuffled)).unwrap());

            let min_x = specs.iter().map(|s| s.0).fold(f64::INFINITY, f64::min);
            let min_y = specs.iter().map(|s| s.1).fold(f64::INFINITY, f64::min);
            let max_x = specs.iter().map(|s| s.0 + s.2).fold(f64::NEG_INFINITY, f64::max);
            let max_y = specs.iter().map(|s| s.1 + s.2).fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(bounds.min(), coord! { x: min_x, y: min_y });
            prop_assert_eq!(bounds.max(), coord! { x: max_x, y: max_y });
        }
    }
}
