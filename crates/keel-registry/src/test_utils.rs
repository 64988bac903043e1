use std::{fs, path::Path};

use tempfile::TempDir;

pub const REGISTRY_UUID: &str = "23338594-aafe-5451-b93e-139f81909106";
pub const FOO_UUID: &str = "7876af07-990d-54b4-ab0e-23690620f79a";
pub const BAR_UUID: &str = "a93c6f00-e57d-5684-b7b6-d8193f3e46c0";
pub const OLD_BAR_UUID: &str = "0b1a1467-8014-51b9-945f-bf0ae24f4b77";

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A registry with `Foo`, two packages named `Bar`, and the runtime pseudo-package.
pub fn sample_registry() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "Registry.toml",
        &format!(
            r#"
name = "General"
uuid = "{REGISTRY_UUID}"
repo = "https://example.com/General.git"
description = "Sample registry"

[packages]
{FOO_UUID} = {{ name = "Foo", path = "F/Foo" }}
{BAR_UUID} = {{ name = "Bar", path = "B/Bar" }}
{OLD_BAR_UUID} = {{ name = "Bar", path = "B/Bar_old" }}
1222c4b2-2114-5bfd-aeef-88e4692bbb3e = {{ name = "julia", path = "J/julia" }}
"#
        ),
    );

    write(
        root,
        "F/Foo/Package.toml",
        &format!(
            r#"
name = "Foo"
uuid = "{FOO_UUID}"
repo = "https://example.com/Foo.jl.git"
"#
        ),
    );
    write(
        root,
        "F/Foo/Versions.toml",
        r#"
["1.0.0"]
git-tree-sha1 = "1111111111111111111111111111111111111111"

["1.1.0"]
git-tree-sha1 = "2222222222222222222222222222222222222222"
yanked = true

["2.0.0"]
git-tree-sha1 = "3333333333333333333333333333333333333333"
"#,
    );
    write(
        root,
        "F/Foo/Compat.toml",
        r#"
["1-1.1"]
julia = "1.6"

[2]
julia = "1.8"

[1-2]
Bar = "0.5"
"#,
    );
    write(
        root,
        "F/Foo/Deps.toml",
        &format!(
            r#"
[1-2]
Bar = "{BAR_UUID}"

[2]
julia = "1222c4b2-2114-5bfd-aeef-88e4692bbb3e"
"#
        ),
    );

    write(
        root,
        "B/Bar/Package.toml",
        "name = \"Bar\"\nsubdir = \"lib/Bar\"\n",
    );
    write(
        root,
        "B/Bar/Versions.toml",
        r#"
["0.5.0"]
git-tree-sha1 = "4444444444444444444444444444444444444444"

["1.0.0"]
git-tree-sha1 = "5555555555555555555555555555555555555555"
"#,
    );
    write(
        root,
        "B/Bar/Compat.toml",
        r#"
["0.5-1"]
julia = "1.6"
"#,
    );

    write(root, "B/Bar_old/Package.toml", "name = \"Bar\"\n");
    write(
        root,
        "B/Bar_old/Versions.toml",
        r#"
["0.1.0"]
git-tree-sha1 = "6666666666666666666666666666666666666666"
"#,
    );

    dir
}
