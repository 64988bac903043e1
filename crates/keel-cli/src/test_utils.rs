use std::{fs, path::Path};

use keel_config::config::Config;
use tempfile::{tempdir, TempDir};

use crate::context::KeelContext;

pub const FOO_UUID: &str = "7876af07-990d-54b4-ab0e-23690620f79a";
pub const BAR_UUID: &str = "a93c6f00-e57d-5684-b7b6-d8193f3e46c0";
pub const OTHER_BAR_UUID: &str = "0b1a1467-8014-51b9-945f-bf0ae24f4b77";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A depot with two registries. `General` has `Foo` and `Bar`; `Extra` has a second
/// `Bar` that also released 1.0.0.
pub fn sample_depot() -> TempDir {
    let dir = tempdir().unwrap();
    let general = dir.path().join("registries/General");
    let extra = dir.path().join("registries/Extra");

    write(
        &general,
        "Registry.toml",
        &format!(
            "name = \"General\"\nuuid = \"23338594-aafe-5451-b93e-139f81909106\"\n\n\
             [packages]\n\
             {FOO_UUID} = {{ name = \"Foo\", path = \"F/Foo\" }}\n\
             {BAR_UUID} = {{ name = \"Bar\", path = \"B/Bar\" }}\n"
        ),
    );
    write(&general, "F/Foo/Package.toml", "name = \"Foo\"\n");
    write(
        &general,
        "F/Foo/Versions.toml",
        "[\"1.0.0\"]\ngit-tree-sha1 = \"aa\"\n",
    );
    write(
        &general,
        "F/Foo/Compat.toml",
        "[1]\njulia = \"1.6\"\nBar = \"1\"\n",
    );
    write(
        &general,
        "F/Foo/Deps.toml",
        &format!("[1]\nBar = \"{BAR_UUID}\"\n"),
    );
    write(&general, "B/Bar/Package.toml", "name = \"Bar\"\n");
    write(
        &general,
        "B/Bar/Versions.toml",
        "[\"1.0.0\"]\ngit-tree-sha1 = \"bb\"\n",
    );

    write(
        &extra,
        "Registry.toml",
        &format!(
            "name = \"Extra\"\nuuid = \"5b2a2a62-6f4d-4c4d-9a52-6e29a8d1d3b1\"\n\n\
             [packages]\n\
             {OTHER_BAR_UUID} = {{ name = \"Bar\", path = \"B/Bar\" }}\n"
        ),
    );
    write(&extra, "B/Bar/Package.toml", "name = \"Bar\"\n");
    write(
        &extra,
        "B/Bar/Versions.toml",
        "[\"1.0.0\"]\ngit-tree-sha1 = \"cc\"\n",
    );

    dir
}

pub fn context_for(depot: &TempDir) -> KeelContext {
    let roots = vec![depot.path().display().to_string()];
    KeelContext::new(Config::default_config(), &roots, false).unwrap()
}
