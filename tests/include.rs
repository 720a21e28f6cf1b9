//! End-to-end rendering and audit behaviour against a project on disk.

use std::fs;
use std::path::Path;

use docinclude::audit::{AuditOptions, audit};
use docinclude::error::{AnchorError, IncludeError};
use docinclude::project::{ProjectIndex, ScanOptions};
use docinclude::template::Renderer;
use tempfile::TempDir;

const SERVER_RS: &str = "\
use std::net::TcpListener;

// ANCHOR: bind
fn bind() -> TcpListener {
    // ANCHOR: addr
    let addr = \"127.0.0.1:0\";
    // ANCHOR_END: addr
    TcpListener::bind(addr).unwrap()
}
// ANCHOR_END: bind
";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/server.rs", SERVER_RS);
    write(tmp.path(), "scripts/setup.sh", "#!/bin/sh\necho ready\n");
    tmp
}

fn index(tmp: &TempDir) -> ProjectIndex {
    ProjectIndex::scan(tmp.path(), &ScanOptions::default()).unwrap()
}

#[test]
fn anchor_does_not_exist() {
    let tmp = project();
    let index = index(&tmp);
    let err = Renderer::new(&index)
        .render("{{#include server.rs:listen}}")
        .unwrap_err();

    match err {
        IncludeError::AnchorNotFound {
            anchor, available, ..
        } => {
            assert_eq!(anchor, "listen");
            assert_eq!(available, vec!["bind", "addr"]);
        }
        other => panic!("expected AnchorNotFound, got {other:?}"),
    }
}

#[test]
fn file_does_not_exist() {
    let tmp = project();
    let index = index(&tmp);
    let mut renderer = Renderer::new(&index);

    assert!(matches!(
        renderer.render("{{#include client.rs}}"),
        Err(IncludeError::FileNotFound { .. })
    ));
    assert!(matches!(
        renderer.render("{{#include src/client.rs:bind}}"),
        Err(IncludeError::FileNotFound { .. })
    ));
}

#[test]
fn template_missing_file_or_anchor_arguments() {
    let tmp = project();
    let index = index(&tmp);
    let mut renderer = Renderer::new(&index);

    let err = renderer.render("# Title\n\n{{#include }}\n").unwrap_err();
    assert!(matches!(
        err,
        IncludeError::MissingArgument {
            line: 3,
            missing: "file"
        }
    ));

    let err = renderer.render("{{#include server.rs:}}").unwrap_err();
    assert!(matches!(
        err,
        IncludeError::MissingArgument {
            missing: "anchor",
            ..
        }
    ));
}

#[test]
fn included_anchor_excludes_other_anchors() {
    let tmp = project();
    let index = index(&tmp);
    let rendered = Renderer::new(&index)
        .render("```rust\n{{#include server.rs:bind}}\n```\n")
        .unwrap();

    assert_eq!(
        rendered,
        "```rust\n\
fn bind() -> TcpListener {\n    let addr = \"127.0.0.1:0\";\n    TcpListener::bind(addr).unwrap()\n}\n\
```\n"
    );
    assert!(!rendered.contains("ANCHOR"));
    assert!(!rendered.contains("use std::net"));
}

#[test]
fn whole_file_include_strips_markers() {
    let tmp = project();
    let index = index(&tmp);
    let rendered = Renderer::new(&index)
        .render("{{#include src/server.rs}}")
        .unwrap();
    assert!(rendered.starts_with("use std::net::TcpListener;"));
    assert!(rendered.contains("fn bind()"));
    assert!(!rendered.contains("ANCHOR"));
}

#[test]
fn escaped_directive_is_emitted_literally() {
    let tmp = project();
    let index = index(&tmp);
    let rendered = Renderer::new(&index)
        .render(r"Write \{{#include file.rs:name}} to include. {{#include setup.sh}}")
        .unwrap();
    assert_eq!(
        rendered,
        "Write {{#include file.rs:name}} to include. #!/bin/sh\necho ready"
    );
}

#[test]
fn does_find_duplicate_files() {
    let tmp = project();
    write(tmp.path(), "src/util.rs", "fn a() {}\n");
    write(tmp.path(), "tests/util.rs", "fn b() {}\n");
    let index = index(&tmp);

    let report = audit(&index, &AuditOptions::default());
    assert!(!report.is_clean());
    assert_eq!(report.duplicate_files.len(), 1);
    assert_eq!(report.duplicate_files[0].name, "util.rs");

    let err = Renderer::new(&index)
        .render("{{#include util.rs}}")
        .unwrap_err();
    assert!(matches!(err, IncludeError::AmbiguousFile { .. }));
}

#[test]
fn does_find_duplicate_anchors() {
    let tmp = project();
    write(
        tmp.path(),
        "src/dup.py",
        "# ANCHOR: run\nrun()\n# ANCHOR_END: run\n# ANCHOR: run\nrun_again()\n# ANCHOR_END: run\n",
    );
    let index = index(&tmp);

    let report = audit(&index, &AuditOptions::default());
    assert_eq!(report.anchor_problems.len(), 1);
    assert_eq!(report.anchor_problems[0].path, Path::new("src/dup.py"));
    assert!(report.anchor_problems[0].error.contains("duplicate anchor 'run'"));

    let err = Renderer::new(&index)
        .render("{{#include dup.py:run}}")
        .unwrap_err();
    match err {
        IncludeError::Anchor { source, .. } => assert_eq!(
            source,
            AnchorError::DuplicateAnchor {
                name: "run".into(),
                first_line: 1,
                line: 4,
            }
        ),
        other => panic!("expected duplicate anchor error, got {other:?}"),
    }
}
