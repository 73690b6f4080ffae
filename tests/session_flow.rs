use std::{
    io::Write,
    time::{Duration, Instant},
};

use commune_atlas::{
    AtlasError, Config, Effect, Event, Session,
    error::LoadError,
    selection::{ClickedFeature, SelectionState},
    table::Bucket,
};
use geo::coord;
use pretty_assertions::assert_eq;

const COMMUNES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    { "type": "Feature",
      "properties": { "ID": "44109", "NOM": "Nantes", "travel_time_s": 420, "prix_m2_appartement": "3100;4200" },
      "geometry": { "type": "Polygon", "coordinates": [[[-1.65, 47.18], [-1.48, 47.18], [-1.48, 47.30], [-1.65, 47.30], [-1.65, 47.18]]] } },
    { "type": "Feature",
      "properties": { "ID": "44143", "NOM": "Rezé", "travel_time_s": 840 },
      "geometry": { "type": "MultiPolygon", "coordinates": [
        [[[-1.60, 47.14], [-1.52, 47.14], [-1.52, 47.18], [-1.60, 47.18], [-1.60, 47.14]]],
        [[[-1.50, 47.10], [-1.49, 47.10], [-1.49, 47.11], [-1.50, 47.10]]]
      ] } },
    { "type": "Feature",
      "properties": { "ID": "44162", "NOM": "Saint-Herblain", "travel_time_s": 1500 },
      "geometry": { "type": "Polygon", "coordinates": [[[-1.70, 47.20], [-1.65, 47.20], [-1.65, 47.25], [-1.70, 47.25], [-1.70, 47.20]]] } },
    { "type": "Feature",
      "properties": { "ID": "44190", "NOM": "Saint-Sébastien-sur-Loire", "travel_time_s": 840 },
      "geometry": { "type": "Polygon", "coordinates": [[[-1.52, 47.19], [-1.47, 47.19], [-1.47, 47.22], [-1.52, 47.22], [-1.52, 47.19]]] } }
  ]
}"#;

fn load(contents: &str) -> Result<(Session, Vec<Effect>), AtlasError> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    let mut config = Config::default();
    config.data.geojson_path = file.path().to_path_buf();
    Session::load(config)
}

#[test]
fn load_fits_view_to_all_communes() {
    let (session, effects) = load(COMMUNES).unwrap();
    assert_eq!(session.features().len(), 4);
    match effects.as_slice() {
        [Effect::FitBounds { bounds, max_zoom, .. }] => {
            assert_eq!(bounds.min(), coord! { x: -1.70, y: 47.10 });
            assert_eq!(bounds.max(), coord! { x: -1.47, y: 47.30 });
            assert_eq!(*max_zoom, 10.0);
        }
        other => panic!("unexpected effects: {other:?}"),
    }
}

#[test]
fn empty_or_broken_documents_fail_to_load() {
    let err = load(r#"{"type":"FeatureCollection","features":[]}"#).err().unwrap();
    assert!(matches!(err, AtlasError::LoadFailure(LoadError::Empty)));

    let err = load("not geojson").err().unwrap();
    assert!(matches!(err, AtlasError::LoadFailure(LoadError::Parse(_))));

    let broken = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"ID":"1","NOM":"Vide"},
         "geometry":{"type":"MultiPolygon","coordinates":[]}}]}"#;
    let err = load(broken).err().unwrap();
    assert!(matches!(err, AtlasError::LoadFailure(LoadError::InvalidGeometry { .. })));
}

#[test]
fn search_then_pick_flies_to_commune() {
    let (mut session, _) = load(COMMUNES).unwrap();
    let t0 = Instant::now();

    session.handle(Event::SearchInput { text: "SAINT-SEB".into(), at: t0 }).unwrap();
    let effects = session.handle(Event::Tick(t0 + Duration::from_millis(250))).unwrap();
    let Some(Effect::ShowSearchResults(hits)) = effects.first() else {
        panic!("expected search results, got {effects:?}");
    };
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Saint-Sébastien-sur-Loire");

    let effects = session.handle(Event::SearchResultPicked(hits[0].id.clone())).unwrap();
    assert_eq!(session.selection(), &SelectionState::Selected("44190".into()));
    assert!(effects.contains(&Effect::Highlight("44190".into())));
    let pan = effects.iter().find_map(|e| match e {
        Effect::PanTo { center, zoom, duration } => Some((*center, *zoom, *duration)),
        _ => None,
    });
    let (center, zoom, duration) = pan.unwrap();
    // Średnia pięciu wierzchołków, z powtórzonym pierwszym.
    assert!((center.x - (-1.52 * 3.0 - 1.47 * 2.0) / 5.0).abs() < 1e-12);
    assert!((center.y - (47.19 * 3.0 + 47.22 * 2.0) / 5.0).abs() < 1e-12);
    assert_eq!(zoom, 12.0);
    assert_eq!(duration, Duration::from_millis(1500));
}

#[test]
fn multipolygon_pick_centres_on_largest_part() {
    let (mut session, _) = load(COMMUNES).unwrap();
    let effects = session.handle(Event::RowPicked("44143".into())).unwrap();
    let center = effects
        .iter()
        .find_map(|e| match e {
            Effect::PanTo { center, .. } => Some(*center),
            _ => None,
        })
        .unwrap();
    assert!(center.y > 47.14 && center.y < 47.18);
    assert_eq!(effects.last(), Some(&Effect::DismissTable));
}

#[test]
fn map_click_then_background_click() {
    let (mut session, _) = load(COMMUNES).unwrap();
    let at = coord! { x: -1.55, y: 47.25 };
    let hit = ClickedFeature { id: "44109".into(), name: "Nantes".into() };
    let effects = session.handle(Event::MapClick { hit: Some(hit), at }).unwrap();
    assert_eq!(effects[0], Effect::ShowPopup { at, label: "Nantes".into() });
    assert_eq!(session.selection(), &SelectionState::Selected("44109".into()));

    let effects = session
        .handle(Event::MapClick { hit: None, at: coord! { x: 0.0, y: 0.0 } })
        .unwrap();
    assert_eq!(session.selection(), &SelectionState::Unselected);
    assert_eq!(
        effects,
        vec![Effect::CloseDetailPanel, Effect::ClearHighlight, Effect::ClosePopup]
    );
}

#[test]
fn unknown_click_payload_is_rejected_without_losing_selection() {
    let (mut session, _) = load(COMMUNES).unwrap();
    session.handle(Event::RowPicked("44162".into())).unwrap();
    let hit = ClickedFeature { id: "99999".into(), name: "Ailleurs".into() };
    let err = session
        .handle(Event::MapClick { hit: Some(hit), at: coord! { x: 0.0, y: 0.0 } })
        .unwrap_err();
    assert!(matches!(err, AtlasError::UnknownFeature(id) if id == "99999"));
    assert_eq!(session.selection(), &SelectionState::Selected("44162".into()));
}

#[test]
fn table_is_sorted_and_filtered() {
    let (mut session, _) = load(COMMUNES).unwrap();
    let names: Vec<&str> = session.rows().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Nantes", "Rezé", "Saint-Sébastien-sur-Loire", "Saint-Herblain"]);
    assert_eq!(session.rows()[0].secondary_label, "3100–4200");
    assert_eq!(session.rows()[1].secondary_label, "N/A");

    let counts = session.bucket_counts();
    assert_eq!((counts.near, counts.medium, counts.far), (1, 2, 1));

    let effects = session.handle(Event::FilterChanged(Bucket::Medium)).unwrap();
    assert_eq!(effects, vec![Effect::ShowTable { filter: Bucket::Medium }]);
    let visible: Vec<&str> = session.visible_rows().into_iter().map(|r| r.id.as_str()).collect();
    assert_eq!(visible, vec!["44143", "44190"]);

    // Filtr nie dotyka wyboru.
    assert_eq!(session.selection(), &SelectionState::Unselected);
}
