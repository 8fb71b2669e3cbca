use std::path::Path;

/// Call site a record is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller<'a> {
    /// Unqualified name of the enclosing function, when known.
    pub func: Option<&'a str>,
    pub file: &'a str,
    pub line: u32,
}

/// Reduces the type name of an item nested in a function to that function's bare name.
///
/// `my_app::jobs::run::__f` becomes `run`; closure and async block segments are skipped,
/// so `my_app::main::{{closure}}::__f` becomes `main`.
pub fn short_function_name(type_name: &str) -> &str {
    let mut name = type_name.strip_suffix("::__f").unwrap_or(type_name);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Turns a `file!()` path into an absolute one.
///
/// `file!()` is relative to the workspace root, which is the crate's manifest directory or
/// one of its ancestors. The first ancestor under which the file exists wins; when the
/// sources are gone the path is joined to the manifest directory.
pub fn absolute_source_path(manifest_dir: &str, file: &str) -> String {
    let file_path = Path::new(file);
    if file_path.is_absolute() {
        return file.to_string();
    }
    let manifest_dir = Path::new(manifest_dir);
    manifest_dir
        .ancestors()
        .map(|root| root.join(file_path))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| manifest_dir.join(file_path))
        .to_string_lossy()
        .into_owned()
}
