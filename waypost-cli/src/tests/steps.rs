//! Behaviour-driven step definitions driving the query command scenarios.

use super::helpers::{DatasetFiles, feature_ids, run_cli};
use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use waypost_core::routing::RoadNetworkError;
use waypost_core::store::sqlite::load_points_of_interest;
use waypost_core::{EngineError, FeatureId, NotFoundReason};

const IMPORT_DOCUMENT: &str = r#"{
    "points_of_interest": [
        {"id": 7, "name": "spring", "categories": ["DrinkingWater"],
         "geometry": {"type": "Point", "coordinates": {"x": 0.0, "y": 0.0}}}
    ],
    "trails": [
        {"id": 70, "name": "loop", "trail_type": "polygon", "difficulty": "easy",
         "geometry": {"type": "Polygon", "coordinates": [
             {"x": -0.01, "y": -0.01}, {"x": 0.01, "y": -0.01}, {"x": 0.01, "y": 0.01}
         ]}}
    ],
    "vertices": [
        {"id": 1, "coord": {"x": 0.0, "y": 0.0}},
        {"id": 2, "coord": {"x": 0.001, "y": 0.0}}
    ],
    "edges": [{"id": 1, "source": 1, "target": 2, "cost": 1.0}]
}"#;

const DANGLING_EDGE_DOCUMENT: &str = r#"{
    "points_of_interest": [
        {"id": 7, "name": "spring",
         "geometry": {"type": "Point", "coordinates": {"x": 0.0, "y": 0.0}}}
    ],
    "vertices": [{"id": 1, "coord": {"x": 0.0, "y": 0.0}}],
    "edges": [{"id": 1, "source": 1, "target": 99, "cost": 1.0}]
}"#;

#[derive(Debug)]
struct CommandWorld {
    files: DatasetFiles,
    use_missing_database: RefCell<bool>,
    database_override: RefCell<Option<Utf8PathBuf>>,
    document: RefCell<Option<Utf8PathBuf>>,
    result: RefCell<Option<Result<Value, CliError>>>,
}

impl CommandWorld {
    fn database_arg(&self) -> String {
        if *self.use_missing_database.borrow() {
            return self.files.missing().into_string();
        }
        self.database_override
            .borrow()
            .as_ref()
            .map_or_else(|| self.files.database().to_string(), ToString::to_string)
    }

    fn import_into(&self, database: &Utf8Path) {
        let document = self.document.borrow().clone().expect("document written");
        let outcome = run_cli(&["import", document.as_str(), "--database", database.as_str()]);
        self.result.replace(Some(outcome));
    }

    fn with_error(&self, check: impl FnOnce(&CliError)) {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        check(error);
    }

    fn output(&self) -> Value {
        let borrowed = self.result.borrow();
        borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect("expected success")
            .clone()
    }
}

#[fixture]
fn world() -> CommandWorld {
    CommandWorld {
        files: DatasetFiles::new(),
        use_missing_database: RefCell::new(false),
        database_override: RefCell::new(None),
        document: RefCell::new(None),
        result: RefCell::new(None),
    }
}

#[given("a sample dataset on disk")]
fn sample_dataset(#[from(world)] world: &CommandWorld) {
    assert!(world.files.database().is_file());
}

#[given("the dataset file does not exist")]
fn dataset_missing(#[from(world)] world: &CommandWorld) {
    *world.use_missing_database.borrow_mut() = true;
}

#[given("a dataset document on disk")]
fn dataset_document(#[from(world)] world: &CommandWorld) {
    let path = world.files.write("dataset.json", IMPORT_DOCUMENT);
    world.document.replace(Some(path));
}

#[given("a dataset document whose road network has a dangling edge")]
fn dangling_document(#[from(world)] world: &CommandWorld) {
    let path = world.files.write("dangling.json", DANGLING_EDGE_DOCUMENT);
    world.document.replace(Some(path));
}

#[when("I import the document into a new dataset")]
fn import_into_new(#[from(world)] world: &CommandWorld) {
    let database = world.files.path("imported.db");
    world.import_into(&database);
    world.database_override.replace(Some(database));
}

#[when("I import the document into the sample dataset")]
fn import_into_sample(#[from(world)] world: &CommandWorld) {
    world.import_into(world.files.database());
}

#[when("I run {command}")]
fn run_command(#[from(world)] world: &CommandWorld, command: String) {
    let database = world.database_arg();
    let mut args: Vec<&str> = command.trim_matches('"').split_whitespace().collect();
    args.extend(["--database", database.as_str()]);
    world.result.replace(Some(run_cli(&args)));
}

#[then("the command succeeds")]
fn command_succeeds(#[from(world)] world: &CommandWorld) {
    let _ = world.output();
}

#[then("the printed features are {ids}")]
fn printed_features(#[from(world)] world: &CommandWorld, ids: String) {
    let expected: Vec<u64> = ids
        .trim_matches('"')
        .split(',')
        .map(|id| id.trim().parse().expect("numeric id"))
        .collect();
    assert_eq!(feature_ids(&world.output()), expected);
}

#[then("the printed route ends at vertex {vertex}")]
fn route_ends_at(#[from(world)] world: &CommandWorld, vertex: u64) {
    let output = world.output();
    let last = output
        .get("steps")
        .and_then(Value::as_array)
        .and_then(|steps| steps.last())
        .and_then(|step| step.get("node"))
        .and_then(Value::as_u64);
    assert_eq!(last, Some(vertex));
}

#[then("the command fails because feature {id} is missing")]
fn feature_missing(#[from(world)] world: &CommandWorld, id: u64) {
    world.with_error(|error| match error {
        CliError::Engine(EngineError::FeatureNotFound {
            id: found,
            reason: NotFoundReason::Missing,
        }) => assert_eq!(*found, FeatureId(id)),
        other => panic!("expected FeatureNotFound, found {other:?}"),
    });
}

#[then("the import reports {pois} point of interest and {trails} trail")]
fn import_counts(#[from(world)] world: &CommandWorld, pois: u64, trails: u64) {
    let output = world.output();
    assert_eq!(
        output.get("points_of_interest").and_then(Value::as_u64),
        Some(pois)
    );
    assert_eq!(output.get("trails").and_then(Value::as_u64), Some(trails));
}

#[then("the command fails because the road network is invalid")]
fn network_invalid(#[from(world)] world: &CommandWorld) {
    world.with_error(|error| match error {
        CliError::InvalidNetwork(RoadNetworkError::DanglingEdge { .. }) => {}
        other => panic!("expected InvalidNetwork, found {other:?}"),
    });
}

#[then("the sample dataset still holds only its original points of interest")]
fn sample_unchanged(#[from(world)] world: &CommandWorld) {
    let (store, _) = load_points_of_interest(world.files.database()).expect("load dataset");
    let ids: Vec<u64> = store.records().iter().map(|poi| poi.feature.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[then("the command fails because the dataset file is missing")]
fn dataset_file_missing(#[from(world)] world: &CommandWorld) {
    world.with_error(|error| match error {
        CliError::MissingSourceFile { field, .. } => assert_eq!(*field, ARG_DATABASE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    });
}

macro_rules! register_query_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/query_commands.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CommandWorld) {
            let _ = world;
        }
    };
}

register_query_scenario!(
    nearest_command,
    "listing the nearest distinct points of interest"
);
register_query_scenario!(
    route_command,
    "routing to a point of interest over the road network"
);
register_query_scenario!(
    route_missing_destination,
    "rejecting a destination that is not stored"
);
register_query_scenario!(missing_dataset, "rejecting a missing dataset");
register_query_scenario!(trails_in_box, "listing trails inside a bounding box");
register_query_scenario!(
    import_round_trip,
    "importing a JSON document and querying the new dataset"
);
register_query_scenario!(
    import_is_atomic,
    "a failed import leaves the dataset untouched"
);
