/// Procedural suspension bridge geometry from dimension constants
use bevy::prelude::*;

use crate::engine::render::instanced_render_plugin::InstanceTransform;
use constants::colors;
use constants::dimensions;
use constants::simulation::{BACK_SPAN_SAMPLES, CABLE_SAMPLES, DECK_SEGMENTS};

/// Structural material classes. Each class owns one contiguous instance list
/// and one shared appearance; counts are fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Component)]
pub enum StructuralClass {
    PrimaryMember,
    ConcreteBase,
    RoadDeck,
    Cable,
    LightBeacon,
}

/// Shared per-class appearance. Attached per class, never per instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassAppearance {
    pub color: Vec3,
    pub roughness: f32,
    pub emissive: bool,
}

impl StructuralClass {
    pub fn appearance(self) -> ClassAppearance {
        match self {
            StructuralClass::PrimaryMember => ClassAppearance {
                color: colors::BRIDGE_RED,
                roughness: 0.7,
                emissive: false,
            },
            StructuralClass::ConcreteBase => ClassAppearance {
                color: colors::CONCRETE,
                roughness: 0.9,
                emissive: false,
            },
            StructuralClass::RoadDeck => ClassAppearance {
                color: colors::ROAD,
                roughness: 0.8,
                emissive: false,
            },
            StructuralClass::Cable => ClassAppearance {
                color: colors::BRIDGE_RED,
                roughness: 0.6,
                emissive: false,
            },
            StructuralClass::LightBeacon => ClassAppearance {
                color: colors::BEACON,
                roughness: 0.3,
                emissive: true,
            },
        }
    }
}

/// Fixed bridge dimensions. Runtime parameters never touch these, so the
/// generated geometry is built once and reused for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeDimensions {
    pub length: f32,
    pub tower_height: f32,
    pub deck_height: f32,
    pub tower_width: f32,
    pub road_width: f32,
}

impl Default for BridgeDimensions {
    fn default() -> Self {
        Self {
            length: dimensions::BRIDGE_LENGTH,
            tower_height: dimensions::TOWER_HEIGHT,
            deck_height: dimensions::DECK_HEIGHT,
            tower_width: dimensions::TOWER_WIDTH,
            road_width: dimensions::ROAD_WIDTH,
        }
    }
}

impl BridgeDimensions {
    /// Tower centres sit a quarter length either side of the midpoint.
    pub fn tower_positions(&self) -> [f32; 2] {
        [-self.length / 4.0, self.length / 4.0]
    }

    /// Lateral offset of the tower legs and cable planes from the centreline.
    pub fn cable_edge_offset(&self) -> f32 {
        self.road_width / 2.0 + 1.0
    }
}

/// Height of the main-span cable at normalised span position `t` in [0, 1].
/// Parabolic sag approximation: equal to the tower height at both ends,
/// dipping by (tower - deck - 5) at the midpoint.
fn main_cable_height(t: f32, dims: &BridgeDimensions) -> f32 {
    let nx = (t - 0.5) * 2.0;
    let drop = dims.tower_height - dims.deck_height - 5.0;
    let sag = nx * nx * drop;
    dims.tower_height - drop + sag
}

/// Immutable instance-transform lists for the five structural classes.
/// Generated deterministically from the dimensions alone.
pub struct BridgeGeometry {
    pub primary_members: Vec<InstanceTransform>,
    pub concrete_bases: Vec<InstanceTransform>,
    pub road_deck: Vec<InstanceTransform>,
    pub cables: Vec<InstanceTransform>,
    pub light_beacons: Vec<InstanceTransform>,
}

impl BridgeGeometry {
    pub fn generate(dims: &BridgeDimensions) -> Self {
        let mut geometry = Self {
            primary_members: Vec::new(),
            concrete_bases: Vec::new(),
            road_deck: Vec::new(),
            cables: Vec::new(),
            light_beacons: Vec::new(),
        };

        geometry.build_towers(dims);
        geometry.build_deck(dims);
        geometry.build_main_cables(dims);
        geometry.build_back_spans(dims);

        geometry
    }

    pub fn class_instances(&self, class: StructuralClass) -> &[InstanceTransform] {
        match class {
            StructuralClass::PrimaryMember => &self.primary_members,
            StructuralClass::ConcreteBase => &self.concrete_bases,
            StructuralClass::RoadDeck => &self.road_deck,
            StructuralClass::Cable => &self.cables,
            StructuralClass::LightBeacon => &self.light_beacons,
        }
    }

    /// Two towers: concrete base, stacked tapering leg segments, periodic
    /// cross-braces and a beacon on each leg top.
    fn build_towers(&mut self, dims: &BridgeDimensions) {
        let leg_offset = dims.cable_edge_offset();
        let leg_size = 3.0;
        let segment_step = 2.0;

        for tx in dims.tower_positions() {
            self.concrete_bases.push(InstanceTransform::new(
                Vec3::new(tx, 0.0, 0.0),
                Vec3::new(
                    dims.tower_width * 1.5,
                    dims.deck_height,
                    dims.road_width * 1.5,
                ),
            ));

            let mut h = dims.deck_height;
            while h < dims.tower_height {
                // Cross-section narrows linearly to 70% at the tower top
                let taper =
                    1.0 - ((h - dims.deck_height) / (dims.tower_height - dims.deck_height)) * 0.3;
                let current_size = leg_size * taper;

                for side in [leg_offset, -leg_offset] {
                    self.primary_members.push(InstanceTransform::new(
                        Vec3::new(tx, h, side),
                        Vec3::new(current_size, segment_step, current_size),
                    ));
                }

                // Cross-braces every ~12 height units, skipping the first five
                let rise = h - dims.deck_height;
                if rise.rem_euclid(12.0) < 2.0 && h > dims.deck_height + 5.0 {
                    self.primary_members.push(InstanceTransform::new(
                        Vec3::new(tx, h, 0.0),
                        Vec3::new(current_size * 0.8, 1.0, leg_offset * 2.0),
                    ));
                }

                h += segment_step;
            }

            for side in [leg_offset, -leg_offset] {
                self.light_beacons.push(InstanceTransform::new(
                    Vec3::new(tx, dims.tower_height, side),
                    Vec3::splat(0.5),
                ));
            }
        }
    }

    /// Road deck: equal-length segments across the full span, each with a
    /// road box and two railings; every 5th segment adds a street light.
    fn build_deck(&mut self, dims: &BridgeDimensions) {
        let segment_len = dims.length / DECK_SEGMENTS as f32;

        for i in 0..DECK_SEGMENTS {
            let x = -dims.length / 2.0 + i as f32 * segment_len;

            self.road_deck.push(InstanceTransform::new(
                Vec3::new(x, dims.deck_height, 0.0),
                Vec3::new(segment_len, 0.5, dims.road_width),
            ));

            for side in [dims.road_width / 2.0, -dims.road_width / 2.0] {
                self.primary_members.push(InstanceTransform::new(
                    Vec3::new(x, dims.deck_height + 1.0, side),
                    Vec3::new(segment_len, 1.0, 0.5),
                ));
            }

            if i % 5 == 0 {
                self.primary_members.push(InstanceTransform::new(
                    Vec3::new(x, dims.deck_height + 2.0, 0.0),
                    Vec3::new(0.2, 4.0, 0.2),
                ));
                self.light_beacons.push(InstanceTransform::new(
                    Vec3::new(x, dims.deck_height + 4.0, 0.0),
                    Vec3::splat(0.3),
                ));
            }
        }
    }

    /// Main-span cables between the towers with parabolic sag, plus a pair
    /// of vertical suspenders every 4th sample.
    fn build_main_cables(&mut self, dims: &BridgeDimensions) {
        let [span_start, span_end] = dims.tower_positions();
        let span_width = span_end - span_start;
        let edge = dims.cable_edge_offset();

        for i in 0..=CABLE_SAMPLES {
            let t = i as f32 / CABLE_SAMPLES as f32;
            let x = span_start + t * span_width;
            let y = main_cable_height(t, dims);

            for side in [edge, -edge] {
                self.cables.push(InstanceTransform::new(
                    Vec3::new(x, y, side),
                    Vec3::splat(0.8),
                ));
            }

            if i % 4 == 0 {
                let height = y - dims.deck_height;
                for side in [edge, -edge] {
                    self.cables.push(InstanceTransform::new(
                        Vec3::new(x, dims.deck_height + height / 2.0, side),
                        Vec3::new(0.2, height, 0.2),
                    ));
                }
            }
        }
    }

    /// Back spans from each tower down to the shore: straight-line height
    /// interpolation, no sag term.
    fn build_back_spans(&mut self, dims: &BridgeDimensions) {
        let [left_tower, right_tower] = dims.tower_positions();
        let spans = [
            (left_tower, -dims.length / 2.0),
            (right_tower, dims.length / 2.0),
        ];
        let edge = dims.cable_edge_offset();

        for (start_x, end_x) in spans {
            for i in 0..=BACK_SPAN_SAMPLES {
                let t = i as f32 / BACK_SPAN_SAMPLES as f32;
                let x = start_x + t * (end_x - start_x);
                let y = dims.tower_height - t * (dims.tower_height - dims.deck_height);

                for side in [edge, -edge] {
                    self.cables.push(InstanceTransform::new(
                        Vec3::new(x, y, side),
                        Vec3::splat(0.8),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn default_geometry() -> BridgeGeometry {
        BridgeGeometry::generate(&BridgeDimensions::default())
    }

    #[test]
    fn generation_is_deterministic() {
        let dims = BridgeDimensions::default();
        let a = BridgeGeometry::generate(&dims);
        let b = BridgeGeometry::generate(&dims);

        assert_eq!(a.primary_members, b.primary_members);
        assert_eq!(a.concrete_bases, b.concrete_bases);
        assert_eq!(a.road_deck, b.road_deck);
        assert_eq!(a.cables, b.cables);
        assert_eq!(a.light_beacons, b.light_beacons);
    }

    #[test]
    fn default_dimension_instance_counts() {
        let geometry = default_geometry();

        // Legs: 23 segments x 2 legs x 2 towers; braces: 3 x 2 towers;
        // railings: 100 segments x 2; street light poles: 20.
        assert_eq!(geometry.primary_members.len(), 92 + 6 + 200 + 20);
        assert_eq!(geometry.concrete_bases.len(), 2);
        assert_eq!(geometry.road_deck.len(), 100);
        // Main span: 101 samples x 2 edges; suspenders: 26 samples x 2;
        // back spans: 31 samples x 2 edges x 2 sides.
        assert_eq!(geometry.cables.len(), 202 + 52 + 124);
        // Tower tops: 4; street lights: 20.
        assert_eq!(geometry.light_beacons.len(), 24);
    }

    #[test]
    fn cable_height_matches_towers_at_span_ends() {
        let dims = BridgeDimensions::default();
        assert!((main_cable_height(0.0, &dims) - dims.tower_height).abs() < EPSILON);
        assert!((main_cable_height(1.0, &dims) - dims.tower_height).abs() < EPSILON);
    }

    #[test]
    fn cable_dips_by_fixed_drop_at_midpoint() {
        let dims = BridgeDimensions::default();
        let expected = dims.tower_height - (dims.tower_height - dims.deck_height - 5.0);
        assert!((main_cable_height(0.5, &dims) - expected).abs() < EPSILON);
    }

    #[test]
    fn cable_sag_is_symmetric_about_midpoint() {
        let dims = BridgeDimensions::default();
        for i in 0..=10 {
            let t = i as f32 / 20.0;
            let low = main_cable_height(t, &dims);
            let high = main_cable_height(1.0 - t, &dims);
            assert!((low - high).abs() < EPSILON);
        }
    }

    #[test]
    fn tower_legs_taper_towards_the_top() {
        let dims = BridgeDimensions::default();
        let geometry = default_geometry();
        let edge = dims.cable_edge_offset();
        let [tx, _] = dims.tower_positions();

        let mut legs: Vec<&InstanceTransform> = geometry
            .primary_members
            .iter()
            .filter(|t| t.position.x == tx && t.position.z == edge)
            .collect();
        legs.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));

        let bottom = legs.first().expect("tower has leg segments");
        let top = legs.last().expect("tower has leg segments");
        assert!((bottom.scale.x - 3.0).abs() < EPSILON);
        assert!(top.scale.x < bottom.scale.x);
        // Taper bottoms out at 70% of the base cross-section
        assert!(top.scale.x >= 3.0 * 0.7 - EPSILON);
    }

    #[test]
    fn counts_scale_with_dimensions_only() {
        let small = BridgeDimensions {
            length: 200.0,
            tower_height: 40.0,
            deck_height: 10.0,
            tower_width: 6.0,
            road_width: 10.0,
        };
        let a = BridgeGeometry::generate(&small);
        let b = BridgeGeometry::generate(&small);
        assert_eq!(a.primary_members.len(), b.primary_members.len());
        assert_eq!(a.cables.len(), b.cables.len());
        // Deck and cable sampling is fixed-resolution, not length-derived
        assert_eq!(a.road_deck.len(), 100);
    }

    #[test]
    fn beacons_sit_on_leg_tops() {
        let dims = BridgeDimensions::default();
        let geometry = default_geometry();
        let tower_beacons = geometry
            .light_beacons
            .iter()
            .filter(|t| t.position.y == dims.tower_height)
            .count();
        assert_eq!(tower_beacons, 4);
    }
}
