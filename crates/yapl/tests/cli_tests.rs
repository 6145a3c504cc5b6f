//! Integration tests for the yapl CLI

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo_bin;
use predicates::prelude::*;
use std::process::Command;
use yapl_testkit::TemplateTree;

/// Helper: a small site with a layout, a partial and a page
fn create_site() -> TemplateTree {
    TemplateTree::new()
        .with_file(
            "layouts/base.yapl",
            "<h1>{% block title %}Untitled{% endblock %}</h1>{% include \"footer\" %}",
        )
        .with_file("layouts/footer.yapl", "<footer>{{ site }}</footer>")
        .with_file(
            "page.yapl",
            "{% extends \"layouts/base\" %}{% block title %}{{ title | default(\"Home\") }}{% endblock %}",
        )
        .with_file("vars.json", r#"{"site": "yapl", "title": "Docs"}"#)
        .with_file("vars.toml", "site = \"toml-site\"\n")
}

fn yapl() -> Command {
    let mut cmd = Command::new(cargo_bin!(env!("CARGO_PKG_NAME")));
    cmd.env_remove("RUST_LOG")
        .env_remove("YAPL_BASE_DIR")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_version_flag() {
    yapl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("yapl"));
}

#[test]
fn test_cli_help_flag() {
    yapl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_render_with_json_vars() {
    let site = create_site();
    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(site.path())
        .arg("--vars")
        .arg(site.path().join("vars.json"))
        .assert()
        .success()
        .stdout("<h1>Docs</h1><footer>yapl</footer>");
}

#[test]
fn test_render_with_toml_vars() {
    let site = create_site();
    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(site.path())
        .arg("--vars")
        .arg(site.path().join("vars.toml"))
        .assert()
        .success()
        .stdout("<h1>Home</h1><footer>toml-site</footer>");
}

#[test]
fn test_render_base_dir_from_env() {
    let site = create_site();
    yapl()
        .arg("render")
        .arg("layouts/footer")
        .env("YAPL_BASE_DIR", site.path())
        .assert()
        .success()
        .stdout("<footer></footer>");
}

#[test]
fn test_render_lists_used_files_on_stderr() {
    let site = create_site();
    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(site.path())
        .arg("--used-files")
        .assert()
        .success()
        .stdout(predicate::str::contains("Used files").not())
        .stderr(predicate::str::contains("Used files:"))
        .stderr(predicate::str::contains("layouts/base.yapl"))
        .stderr(predicate::str::contains("layouts/footer.yapl"))
        .stderr(predicate::str::contains("page.yapl"));
}

#[test]
fn test_render_uses_conventional_config() {
    let site = TemplateTree::new()
        .with_file("yapl.toml", "[whitespace]\ntrim_blocks = false\nlstrip_blocks = false\ndedent_blocks = false\n")
        .with_file("ws.yapl", "{% if true %}\nY\n{% endif %}");
    yapl()
        .arg("render")
        .arg("ws")
        .arg("--base-dir")
        .arg(site.path())
        .assert()
        .success()
        .stdout("\nY\n");
}

#[test]
fn test_render_missing_template_fails() {
    let site = create_site();
    yapl()
        .arg("render")
        .arg("nope")
        .arg("--base-dir")
        .arg(site.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("LOAD_FAILED"));
}

#[test]
fn test_render_path_escape_rejected_unless_lenient() {
    let root = TemplateTree::new()
        .with_file("outside.yapl", "out")
        .with_file("site/page.yapl", "{% include \"../outside\" %}");
    let base = root.path().join("site");

    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(&base)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH_ESCAPE"));

    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(&base)
        .arg("--no-strict")
        .assert()
        .success()
        .stdout("out");
}

#[test]
fn test_render_rejects_bad_vars_file() {
    let site = create_site().with_file("list.json", "[1, 2]");
    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(site.path())
        .arg("--vars")
        .arg(site.path().join("list.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("top level"));
}

#[test]
fn test_render_missing_base_dir_fails() {
    let site = create_site();
    yapl()
        .arg("render")
        .arg("page")
        .arg("--base-dir")
        .arg(site.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Base directory not found"));
}

#[test]
fn test_check_reports_each_template() {
    let site = create_site();
    yapl()
        .arg("check")
        .arg("page")
        .arg("layouts/footer")
        .arg("--base-dir")
        .arg(site.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ page"))
        .stdout(predicate::str::contains("✓ layouts/footer"));
}

#[test]
fn test_check_fails_when_any_template_fails() {
    let site = create_site().with_file("bad.yapl", "{{ x }}{% include \"missing\" %}");
    yapl()
        .arg("check")
        .arg("page")
        .arg("bad")
        .arg("--base-dir")
        .arg(site.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("✓ page"))
        .stdout(predicate::str::contains("✗ bad"))
        .stderr(predicate::str::contains("1 of 2 template(s) failed"));
}

#[test]
fn test_check_requires_templates() {
    yapl().arg("check").assert().failure();
}
