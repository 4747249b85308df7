/// Version of this library, e.g. `"0.1.0"`.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// This library's version followed by the version requirements it declares on its
/// numerical dependencies, formatted as `name=version` and `name=^requirement`.
/// The requirements are those of the manifest, not the versions resolved in a build.
pub fn version_dependencies() -> Vec<String> {
    vec![
        format!("elastoplastic={}", version()),
        "nalgebra=^0.32.2".to_string(),
        "ndarray=^0.15".to_string(),
        "rayon=^1.7".to_string(),
    ]
}
