use std::rc::Rc;

use foundation::GeoBounds;
use layers::{
    Group, Layer, LayerError, LayerGroup, MaterializeError, ProducerError, SequentialLayerGroup,
    SharedMap, geojson_bounds,
};
use tracing::{debug, info};

use crate::engine::{EngineError, NetworkBuilder};
use crate::error::ExplorerError;
use crate::settings::ImportSettings;

pub const OSM_LAYER: &str = "OSM";
pub const NETWORK_LAYER: &str = "Network";
pub const GEOMETRY_LAYER: &str = "Geometry";
pub const LANE_POLYGONS_LAYER: &str = "Lane polygons";
pub const LANE_MARKINGS_LAYER: &str = "Lane markings";
pub const INTERSECTION_MARKINGS_LAYER: &str = "Intersection markings";
pub const DEBUG_ROAD_ORDERING_LAYER: &str = "Debug road ordering";
pub const DEBUG_MOVEMENTS_LAYER: &str = "Debug movements";
pub const DEBUG_LAYER: &str = "Debug";

pub const STEPS_GROUP: &str = "transformation steps";

/// Groups derived from one engine run, not yet on the registry.
#[derive(Debug)]
pub struct BuiltLayers {
    pub primary: LayerGroup,
    pub steps: Option<SequentialLayerGroup>,
    /// Bounds of the plain geometry export.
    pub bounds: Option<GeoBounds>,
    /// Lazy layers that failed while the groups were assembled.
    pub failures: Vec<MaterializeError>,
}

impl BuiltLayers {
    pub fn into_groups(self) -> (Vec<Group>, Vec<MaterializeError>) {
        let mut groups = vec![Group::from(self.primary)];
        groups.extend(self.steps.map(Group::from));
        (groups, self.failures)
    }
}

/// Runs the engine on `raw_input` and wraps its exports into layer groups.
///
/// The primary group is called `group_name`. When the engine recorded debug
/// steps, the primary group starts disabled and a `STEPS_GROUP` sequence holds
/// one group per step, in engine order.
pub fn build_network_layers(
    group_name: &str,
    raw_input: &Rc<str>,
    settings: &ImportSettings,
    builder: &dyn NetworkBuilder,
    map: &SharedMap,
    include_osm: bool,
) -> Result<BuiltLayers, ExplorerError> {
    let network = builder
        .construct(raw_input, settings)
        .map_err(ExplorerError::Construction)?;
    let steps = network
        .debug_steps()
        .map_err(|source| export_failed("debug steps", source))?;
    info!(
        "built {group_name} ({} bytes of input, {} debug steps)",
        raw_input.len(),
        steps.len()
    );

    // Stepwise inspection takes precedence over the final result.
    let mut primary = if steps.is_empty() {
        LayerGroup::new(group_name, map.clone())
    } else {
        LayerGroup::hidden(group_name, map.clone())
    };
    let mut failures = Vec::new();

    if include_osm {
        primary.add_layer(OSM_LAYER, Layer::osm(raw_input.clone()), false)?;
    }

    let geometry = network
        .to_geojson_plain()
        .map_err(|source| export_failed(GEOMETRY_LAYER, source))?;
    let bounds = geojson_bounds(&geometry).ok().flatten();
    primary.add_layer(GEOMETRY_LAYER, Layer::geometry(geometry), true)?;

    let lane_polygons = network
        .to_lane_polygons_geojson()
        .map_err(|source| export_failed(LANE_POLYGONS_LAYER, source))?;
    primary.add_layer(LANE_POLYGONS_LAYER, Layer::lane_polygons(lane_polygons), true)?;

    let lane_markings = network
        .to_lane_markings_geojson()
        .map_err(|source| export_failed(LANE_MARKINGS_LAYER, source))?;
    primary.add_layer(LANE_MARKINGS_LAYER, Layer::lane_markings(lane_markings), true)?;

    let intersection_markings = network
        .to_intersection_markings_geojson()
        .map_err(|source| export_failed(INTERSECTION_MARKINGS_LAYER, source))?;
    primary.add_layer(
        INTERSECTION_MARKINGS_LAYER,
        Layer::intersection_markings(intersection_markings),
        true,
    )?;

    let n = network.clone();
    add_lazy(&mut primary, DEBUG_ROAD_ORDERING_LAYER, &mut failures, move || {
        Ok(Layer::debug(n.debug_clockwise_ordering_geojson()?))
    })?;
    let n = network.clone();
    add_lazy(&mut primary, DEBUG_MOVEMENTS_LAYER, &mut failures, move || {
        Ok(Layer::debug(n.debug_movements_geojson()?))
    })?;

    let mut step_groups = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let mut group = LayerGroup::hidden(format!("Step {}: {}", i + 1, step.label()), map.clone());
        let snapshot = step.network();

        let n = snapshot.clone();
        add_lazy(&mut group, GEOMETRY_LAYER, &mut failures, move || {
            Ok(Layer::geometry(n.to_geojson_plain()?))
        })?;
        let n = snapshot.clone();
        add_lazy(&mut group, LANE_POLYGONS_LAYER, &mut failures, move || {
            Ok(Layer::lane_polygons(n.to_lane_polygons_geojson()?))
        })?;
        let n = snapshot;
        add_lazy(&mut group, LANE_MARKINGS_LAYER, &mut failures, move || {
            Ok(Layer::lane_markings(n.to_lane_markings_geojson()?))
        })?;

        if let Some(debug) = step.to_debug_geojson() {
            let debug: Rc<str> = debug.into();
            add_lazy(&mut group, DEBUG_LAYER, &mut failures, move || {
                Ok(Layer::debug(debug.clone()))
            })?;
        }
        debug!("prepared {}", group.name());
        step_groups.push(group);
    }

    let steps = if step_groups.is_empty() {
        None
    } else {
        Some(SequentialLayerGroup::new(STEPS_GROUP, step_groups))
    };

    Ok(BuiltLayers {
        primary,
        steps,
        bounds,
        failures,
    })
}

fn export_failed(layer: &str, source: EngineError) -> ExplorerError {
    ExplorerError::Export {
        layer: layer.to_string(),
        source,
    }
}

/// Registers a lazy layer, keeping a materialization failure as a per-layer
/// report instead of aborting the build.
fn add_lazy<F>(
    group: &mut LayerGroup,
    name: &str,
    failures: &mut Vec<MaterializeError>,
    thunk: F,
) -> Result<(), LayerError>
where
    F: Fn() -> Result<Layer, ProducerError> + 'static,
{
    match group.add_lazy_layer(name, thunk) {
        Err(LayerError::Materialize(f)) => {
            failures.extend(f);
            Ok(())
        }
        other => other,
    }
}
