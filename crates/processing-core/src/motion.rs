//! Motion preset registry and rotation policy.
//!
//! Scenes without an explicit preset get one from a fixed set of rotation
//! sequences. Selection is a pure function of the scene index:
//!
//! ```text
//! sequence = sequences[index % sequences.len()]
//! preset   = sequence[index % sequence.len()]
//! ```
//!
//! This makes every render reproducible. It does not promise that adjacent
//! scenes differ: two sequences can yield the same preset at neighbouring
//! indices (see `test_adjacent_indices_can_repeat`).

use std::collections::BTreeMap;

use docreel_common::error::{ReelError, ReelResult};
use docreel_project_model::motion::{MotionPreset, PanAnchor};

/// Read-only registry of motion presets plus the rotation sequences.
#[derive(Debug, Clone)]
pub struct MotionLibrary {
    presets: BTreeMap<String, MotionPreset>,
    sequences: Vec<Vec<String>>,
}

impl MotionLibrary {
    /// Build a registry, rejecting presets that would frame outside the
    /// source and sequences that reference unknown ids.
    pub fn new(presets: Vec<MotionPreset>, sequences: Vec<Vec<String>>) -> ReelResult<Self> {
        let mut by_id = BTreeMap::new();
        for preset in presets {
            preset.validate().map_err(ReelError::config)?;
            if by_id.contains_key(&preset.id) {
                return Err(ReelError::config(format!(
                    "duplicate motion preset '{}'",
                    preset.id
                )));
            }
            by_id.insert(preset.id.clone(), preset);
        }

        if sequences.is_empty() {
            return Err(ReelError::config("at least one rotation sequence is required"));
        }
        for (i, sequence) in sequences.iter().enumerate() {
            if sequence.is_empty() {
                return Err(ReelError::config(format!("rotation sequence {i} is empty")));
            }
            if let Some(unknown) = sequence.iter().find(|id| !by_id.contains_key(*id)) {
                return Err(ReelError::config(format!(
                    "rotation sequence {i} references unknown preset '{unknown}'"
                )));
            }
        }

        Ok(Self {
            presets: by_id,
            sequences,
        })
    }

    /// The built-in presets and rotation.
    pub fn builtin() -> Self {
        Self {
            presets: builtin_presets()
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            sequences: builtin_sequences(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&MotionPreset> {
        self.presets.get(id)
    }

    /// Registered preset ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Preset for the scene at `index` of `total_scenes`.
    ///
    /// A registered `explicit` id wins. An unknown id is logged and the
    /// rotation is used instead.
    pub fn preset_for(
        &self,
        index: usize,
        total_scenes: usize,
        explicit: Option<&str>,
    ) -> &MotionPreset {
        if let Some(id) = explicit {
            if let Some(preset) = self.presets.get(id) {
                return preset;
            }
            tracing::warn!(
                preset = id,
                scene = index,
                "Unknown motion preset, using rotation"
            );
        }

        let sequence = &self.sequences[index % self.sequences.len()];
        let id = &sequence[index % sequence.len()];
        tracing::trace!(scene = index, total_scenes, preset = %id, "Rotated motion preset");
        // Every sequence id was checked against the registry in `new`.
        &self.presets[id]
    }
}

fn builtin_sequences() -> Vec<Vec<String>> {
    let sequences: [&[&str]; 3] = [
        &["zoom_in", "pan_right", "zoom_out", "pan_left"],
        &["pan_up", "zoom_in", "pan_down", "zoom_out"],
        &["push_in_left", "pan_right", "push_in_right", "pan_left", "zoom_out"],
    ];
    sequences
        .iter()
        .map(|seq| seq.iter().map(|id| id.to_string()).collect())
        .collect()
}

fn builtin_presets() -> Vec<MotionPreset> {
    const PAN_ZOOM: f64 = 1.15;
    let c = PanAnchor::CENTER;
    vec![
        MotionPreset::new("zoom_in", (1.0, 1.2), c, c),
        MotionPreset::new("zoom_out", (1.2, 1.0), c, c),
        MotionPreset::new(
            "pan_left",
            (PAN_ZOOM, PAN_ZOOM),
            PanAnchor::new(0.56, 0.5),
            PanAnchor::new(0.44, 0.5),
        ),
        MotionPreset::new(
            "pan_right",
            (PAN_ZOOM, PAN_ZOOM),
            PanAnchor::new(0.44, 0.5),
            PanAnchor::new(0.56, 0.5),
        ),
        MotionPreset::new(
            "pan_up",
            (PAN_ZOOM, PAN_ZOOM),
            PanAnchor::new(0.5, 0.56),
            PanAnchor::new(0.5, 0.44),
        ),
        MotionPreset::new(
            "pan_down",
            (PAN_ZOOM, PAN_ZOOM),
            PanAnchor::new(0.5, 0.44),
            PanAnchor::new(0.5, 0.56),
        ),
        MotionPreset::new("push_in_left", (1.0, 1.25), c, PanAnchor::new(0.42, 0.5)),
        MotionPreset::new("push_in_right", (1.0, 1.25), c, PanAnchor::new(0.58, 0.5)),
    ]
}
