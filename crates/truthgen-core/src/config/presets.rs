//! Presets compiled into the binary.

const BUNDLED: &[(&str, &str)] = &[
    ("generic", include_str!("../../presets/generic.yml")),
    ("node", include_str!("../../presets/node.yml")),
    ("python", include_str!("../../presets/python.yml")),
    ("rust", include_str!("../../presets/rust.yml")),
];

/// Raw YAML of a bundled preset, if one exists under `name`.
pub fn bundled_preset(name: &str) -> Option<&'static str> {
    BUNDLED
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, body)| *body)
}

/// Names of all bundled presets, sorted.
pub fn bundled_preset_names() -> Vec<&'static str> {
    BUNDLED.iter().map(|(name, _)| *name).collect()
}
