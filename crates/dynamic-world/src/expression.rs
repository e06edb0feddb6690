//! Earth Engine expression graphs for Dynamic World queries.
//!
//! An expression is a flat map of named value nodes plus the id of the
//! result node; nodes refer to each other through `valueReference`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use mrv_common::DateRange;

use crate::area::AreaOfInterest;

pub const DYNAMIC_WORLD_COLLECTION: &str = "GOOGLE/DYNAMICWORLD/V1";
pub const LABEL_BAND: &str = "label";
/// Band name after reducing `label` with the mode reducer.
pub const LABEL_MODE_BAND: &str = "label_mode";
pub const SCALE_METERS: f64 = 10.0;
pub const MAX_PIXELS: f64 = 1e10;

const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

/// A serialized Earth Engine `Expression`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub values: BTreeMap<String, Value>,
    pub result: String,
}

fn invoke(function: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn reference(id: &str) -> Value {
    json!({ "valueReference": id })
}

#[derive(Default)]
struct GraphBuilder {
    values: BTreeMap<String, Value>,
}

impl GraphBuilder {
    fn add(&mut self, id: &str, node: Value) -> Value {
        self.values.insert(id.to_string(), node);
        reference(id)
    }

    fn finish(self, result: &str) -> Expression {
        Expression {
            values: self.values,
            result: result.to_string(),
        }
    }
}

/// Adds the nodes for the mode composite of the `label` band over `range`,
/// clipped to `area`. Returns the reference to the composite image.
fn add_composite(graph: &mut GraphBuilder, range: &DateRange, area: &AreaOfInterest) -> Value {
    let geometry = graph.add(
        "geometry",
        invoke(
            "GeometryConstructors.MultiPolygon",
            json!({
                "coordinates": constant(json!(area.polygons())),
                "evenOdd": constant(json!(true)),
            }),
        ),
    );

    let collection = graph.add(
        "collection",
        invoke(
            "ImageCollection.load",
            json!({ "id": constant(json!(DYNAMIC_WORLD_COLLECTION)) }),
        ),
    );

    let dated = graph.add(
        "dated",
        invoke(
            "Collection.filter",
            json!({
                "collection": collection,
                "filter": invoke(
                    "Filter.dateRangeContains",
                    json!({
                        "leftValue": invoke(
                            "DateRange",
                            json!({
                                "start": constant(json!(range.start_str())),
                                "end": constant(json!(range.end_str())),
                            }),
                        ),
                        "rightField": constant(json!("system:time_start")),
                    }),
                ),
            }),
        ),
    );

    let bounded = graph.add(
        "bounded",
        invoke(
            "Collection.filter",
            json!({
                "collection": dated,
                "filter": invoke(
                    "Filter.intersects",
                    json!({
                        "leftField": constant(json!(".all")),
                        "rightValue": geometry.clone(),
                    }),
                ),
            }),
        ),
    );

    graph.add(
        "select_label",
        invoke(
            "Image.select",
            json!({
                "input": { "argumentReference": MAPPING_VAR },
                "bandSelectors": constant(json!([LABEL_BAND])),
            }),
        ),
    );

    let labels = graph.add(
        "labels",
        invoke(
            "Collection.map",
            json!({
                "collection": bounded,
                "baseAlgorithm": {
                    "functionDefinitionValue": {
                        "argumentNames": [MAPPING_VAR],
                        "body": "select_label",
                    }
                },
            }),
        ),
    );

    let mode = graph.add(
        "mode",
        invoke(
            "ImageCollection.reduce",
            json!({
                "collection": labels,
                "reducer": invoke("Reducer.mode", json!({})),
            }),
        ),
    );

    graph.add(
        "composite",
        invoke(
            "Image.clip",
            json!({
                "input": mode,
                "geometry": geometry,
            }),
        ),
    )
}

/// The clipped mode composite of the Dynamic World `label` band.
pub fn composite_image(range: &DateRange, area: &AreaOfInterest) -> Expression {
    let mut graph = GraphBuilder::default();
    add_composite(&mut graph, range, area);
    graph.finish("composite")
}

/// Frequency histogram of the composite's `label_mode` band over the area.
///
/// Evaluates to a dictionary of class code (or `"null"`) to pixel count.
pub fn label_histogram(range: &DateRange, area: &AreaOfInterest) -> Expression {
    let mut graph = GraphBuilder::default();
    let composite = add_composite(&mut graph, range, area);
    let geometry = reference("geometry");

    let stats = graph.add(
        "stats",
        invoke(
            "Image.reduceRegion",
            json!({
                "image": composite,
                "reducer": invoke(
                    "Reducer.unweighted",
                    json!({ "reducer": invoke("Reducer.frequencyHistogram", json!({})) }),
                ),
                "geometry": geometry,
                "scale": constant(json!(SCALE_METERS)),
                "maxPixels": constant(json!(MAX_PIXELS)),
            }),
        ),
    );

    graph.add(
        "histogram",
        invoke(
            "Dictionary.get",
            json!({
                "dictionary": stats,
                "key": constant(json!(LABEL_MODE_BAND)),
            }),
        ),
    );
    graph.finish("histogram")
}
