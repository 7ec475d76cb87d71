//! End-to-end scenarios through the engine surface: dataset loads in
//! arbitrary order, tap-to-resolve, selection legend, and a full
//! navigation session.

use ward_mapper::{
    ElectionLookup, Front, LatLng, NavEvent, NavState, Route, TurnInstruction, VehicleProfile,
    WardMapEngine,
};

fn boundary_geojson() -> String {
    // Two bodies, three wards; Ala ward 2 deliberately has no election
    // rows
    let features = [
        (
            "Palakkad",
            "Ala Grama Panchayat",
            "Grama Panchayat",
            "G01",
            "Ala North",
            (76.0, 10.0),
        ),
        (
            "Palakkad",
            "Ala Grama Panchayat",
            "Grama Panchayat",
            "G02",
            "Ala South",
            (76.1, 10.0),
        ),
        (
            "Thrissur",
            "Kodungallur Municipality",
            "Municipality",
            "1",
            "Kodungallur West",
            (76.0, 10.2),
        ),
    ];

    let features_json: Vec<String> = features
        .iter()
        .map(|(district, lsgd, lsgd_type, ward_no, ward_name, (x, y))| {
            format!(
                r#"{{"type":"Feature","properties":{{"District":"{district}","LSGD":"{lsgd}","Lsgd_Type":"{lsgd_type}","Ward_No":"{ward_no}","Ward_Name":"{ward_name}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x},{y}],[{x1},{y}],[{x1},{y1}],[{x},{y1}],[{x},{y}]]]}}}}"#,
                x1 = x + 0.1,
                y1 = y + 0.1,
            )
        })
        .collect();

    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features_json.join(",")
    )
}

fn election_rows_json() -> &'static str {
    // The election dataset spells names without type suffixes and uses
    // bare numeric ward codes
    r#"[
        {"District": "Palakkad", "LSGI Name": "Ala", "ward_code": "01", "Rank": "1",
         "Front": "LDF", "Candidate Name English": "A. Kumar", "Party Name English": "CPI(M)",
         "Candidate Total_votes": "812"},
        {"District": "Palakkad", "LSGI Name": "Ala", "ward_code": "01", "Rank": "2",
         "Front": "UDF", "Candidate Name English": "B. Menon", "Party Name English": "INC",
         "Candidate Total_votes": "640"},
        {"District": "Thrissur", "LSGI Name": "Kodungallur", "ward_code": "1", "Rank": "1",
         "Front": "UDF", "Candidate Name English": "C. Thomas", "Party Name English": "INC",
         "Candidate Total_votes": "990"}
    ]"#
}

#[test]
fn resolve_before_and_after_election_load() {
    let mut engine = WardMapEngine::new();
    engine
        .load_boundaries_text(&boundary_geojson())
        .expect("boundary load");

    // Tap inside Ala ward 1 before election data arrives
    let lookup = engine.resolve_ward_at(10.05, 76.05).expect("inside a ward");
    assert_eq!(lookup.lsgd, "Ala Grama Panchayat");
    assert_eq!(lookup.ward_no, "G01");
    assert_eq!(lookup.election, ElectionLookup::NotLoaded);

    // Election data resolves later, with independently spelled keys
    let rows = engine
        .load_elections_text(election_rows_json())
        .expect("election load");
    assert_eq!(rows, 3);

    let lookup = engine.resolve_ward_at(10.05, 76.05).unwrap();
    match lookup.election {
        ElectionLookup::Found { result } => {
            assert_eq!(result.ward_no, 1);
            let winner = result.winner.expect("rank-1 candidate");
            assert_eq!(winner.name, "A. Kumar");
            assert_eq!(winner.front, Front::Ldf);
            assert_eq!(result.total_votes, 812 + 640);
        }
        other => panic!("expected Found, got {:?}", other),
    }

    // Ward 2 exists in boundaries only: explicit missing state
    let lookup = engine.resolve_ward_at(10.05, 76.15).unwrap();
    assert_eq!(lookup.election, ElectionLookup::Missing);

    // Key lookup joins the suffixed boundary spelling to the plain
    // election spelling and the prefixed ward code to the numeric one
    let result = engine
        .resolve_ward_by_key("Palakkad", "Ala Grama Panchayat", "G01")
        .expect("fuzzy join");
    assert!(!result.is_tie);

    // Outside every ward
    assert!(engine.resolve_ward_at(11.5, 77.5).is_none());
}

#[test]
fn hierarchy_and_legend_follow_selection() {
    let mut engine = WardMapEngine::new();
    engine.load_boundaries_text(&boundary_geojson()).unwrap();
    engine.load_elections_text(election_rows_json()).unwrap();

    let hierarchy = engine.hierarchy().expect("derived from boundaries");
    assert_eq!(hierarchy.district_names(), vec!["Palakkad", "Thrissur"]);
    assert_eq!(hierarchy.types_of("Thrissur"), vec!["Municipality"]);

    engine.select("Palakkad", "Grama Panchayat", "Ala Grama Panchayat");
    let wards = engine.wards_of_selected_body();
    assert_eq!(wards.len(), 2);
    assert_eq!(wards[0].ward_no, "G01");

    let legend = engine.legend().expect("body covered by election data");
    assert_eq!(legend.ldf, 1);
    assert_eq!(legend.udf, 0);
}

#[test]
fn position_updates_drive_detection_and_navigation() {
    let mut engine = WardMapEngine::new();
    engine.load_boundaries_text(&boundary_geojson()).unwrap();

    // Walking into Ala auto-selects it
    let outcome = engine.on_position_update(10.05, 76.05, 1.2, 0);
    assert_eq!(
        outcome.body_change.expect("first fix detects").body,
        "Ala Grama Panchayat"
    );
    assert!(outcome.progress.is_none());

    // Start navigating north through the ward
    let destination = LatLng::new(10.09, 76.05);
    let request = engine.tracker_start(
        LatLng::new(10.05, 76.05),
        destination,
        VehicleProfile::Walk,
        0,
    );
    assert_eq!(request.profile, VehicleProfile::Walk);

    let coordinates: Vec<LatLng> = (0..=40)
        .map(|i| LatLng::new(10.05 + i as f64 * 0.001, 76.05))
        .collect();
    engine.tracker_set_route(
        Route {
            instructions: vec![
                TurnInstruction {
                    text: "Head out on the panchayat road".to_string(),
                    target: LatLng::new(10.07, 76.05),
                    coord_index: 20,
                },
                TurnInstruction {
                    text: "You have arrived at your destination".to_string(),
                    target: destination,
                    coord_index: 40,
                },
            ],
            coordinates,
            total_distance: 4450.0,
            total_time: 3180.0,
        },
        0,
    );

    // Approach the first turn to within ~20m: step advances
    let outcome = engine.on_position_update(10.06985, 76.05, 1.4, 10_000);
    let progress = outcome.progress.expect("navigating with a route");
    assert_eq!(
        progress.events,
        vec![NavEvent::StepAdvanced { step_index: 1 }]
    );

    // Drift well off the route with the cooldown expired: exactly one
    // re-route request, answerable from engine state
    let outcome = engine.on_position_update(10.07, 76.052, 1.4, 25_000);
    let progress = outcome.progress.unwrap();
    assert!(progress.events.contains(&NavEvent::RerouteNeeded));
    let reroute = engine.reroute_request().expect("session active");
    assert_eq!(reroute.destination, destination);

    let outcome = engine.on_position_update(10.07, 76.052, 1.4, 26_000);
    assert!(!outcome
        .progress
        .unwrap()
        .events
        .contains(&NavEvent::RerouteNeeded));

    // Reach the destination: arrival is terminal until exit
    let outcome = engine.on_position_update(10.0899, 76.05, 1.4, 40_000);
    let progress = outcome.progress.unwrap();
    assert_eq!(progress.state, NavState::Arrived);
    assert!(progress.events.contains(&NavEvent::Arrived));

    let outcome = engine.on_position_update(10.0899, 76.05, 1.4, 41_000);
    assert!(outcome.progress.is_none());

    engine.tracker_exit();
    assert_eq!(engine.tracker_state(), NavState::Idle);
}
