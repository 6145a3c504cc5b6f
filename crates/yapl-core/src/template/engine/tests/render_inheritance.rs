//! Template inheritance tests (extends / block / mixin / super)

use super::helpers::{memory, to_vars};
use super::*;
use serde_json::json;

async fn render_child(templates: &[(&str, &str)], child: &str, vars: &Vars) -> Rendered {
    memory(templates)
        .render_string(child, vars, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_extends_with_super() {
    let parent = [("p.yapl", "{% block a %}PARENT{% endblock %}")];
    let child = "{% extends \"p\" %}{% block a %}X{{ super() }}Y{% endblock %}";
    let rendered = render_child(&parent, child, &Vars::new()).await;
    assert_eq!(rendered.content, "XPARENTY");
    assert_eq!(rendered.used_files, vec!["p.yapl".to_string()]);
}

#[tokio::test]
async fn test_super_only_override_matches_parent() {
    let parent = [("p.yapl", "<{% block a %}PARENT {{ v }}{% endblock %}>")];
    let vars = to_vars(json!({"v": 1}));
    let plain = render_child(&parent, "{% extends \"p\" %}", &vars).await;
    let overridden = render_child(
        &parent,
        "{% extends \"p\" %}{% block a %}{{ super() }}{% endblock %}",
        &vars,
    )
    .await;
    assert_eq!(plain.content, "<PARENT 1>");
    assert_eq!(overridden.content, plain.content);
}

#[tokio::test]
async fn test_parent_skeleton_keeps_text_and_order() {
    let parent = [(
        "layout.yapl",
        "<title>{% block title %}Default{% endblock %}</title>\n<body>{% block body %}{% endblock %}</body>",
    )];
    let child = "{% extends \"layout\" %}\nignored text\n{% block body %}Hello {{ name }}{% endblock %}";
    let vars = to_vars(json!({"name": "Ada"}));
    let rendered = render_child(&parent, child, &vars).await;
    assert_eq!(rendered.content, "<title>Default</title>\n<body>Hello Ada</body>");
}

#[tokio::test]
async fn test_additive_blocks_appended() {
    let parent = [("p.yapl", "<{% block a %}P{% endblock %}>")];
    let child = "{% extends \"p\" %}{% block extra %}E1{% endblock %}{% block more %}E2{% endblock %}";
    let rendered = render_child(&parent, child, &Vars::new()).await;
    assert_eq!(rendered.content, "<P>\nE1\nE2");
}

#[tokio::test]
async fn test_mixins_merge_between_parent_and_child() {
    let templates = [
        ("p.yapl", "{% block a %}P{% endblock %}|{% block b %}PB{% endblock %}"),
        ("m1.yapl", "{% block a %}first{% endblock %}"),
        (
            "m2.yapl",
            "{% block a %}M{{ super() }}{% endblock %}{% block b %}MB{% endblock %}",
        ),
    ];
    let child = "{% extends \"p\" %}{% mixin \"m1\", \"m2\" %}{% block b %}C{{ super() }}{% endblock %}";
    let rendered = render_child(&templates, child, &Vars::new()).await;
    // Later mixins win; mixin super() is the parent block, child super() the merged one
    assert_eq!(rendered.content, "MP|CMB");
    assert_eq!(
        rendered.used_files,
        vec!["m1.yapl".to_string(), "m2.yapl".to_string(), "p.yapl".to_string()]
    );
}

#[tokio::test]
async fn test_multi_level_inheritance_chains_super() {
    let templates = [
        ("base.yapl", "[{% block a %}base{% endblock %}]"),
        ("mid.yapl", "{% extends \"base\" %}{% block a %}mid({{ super() }}){% endblock %}"),
    ];
    let child = "{% extends \"mid\" %}{% block a %}child<{{ super() }}>{% endblock %}";
    let rendered = render_child(&templates, child, &Vars::new()).await;
    assert_eq!(rendered.content, "[child<mid(base)>]");
    assert_eq!(
        rendered.used_files,
        vec!["base.yapl".to_string(), "mid.yapl".to_string()]
    );
}

#[tokio::test]
async fn test_nested_block_override() {
    let templates = [(
        "layout.yapl",
        "<main>{% block content %}[{% block title %}T{% endblock %}]{% endblock %}</main>",
    )];
    let child = "{% extends \"layout\" %}{% block title %}Page{% endblock %}";
    let rendered = render_child(&templates, child, &Vars::new()).await;
    assert_eq!(rendered.content, "<main>[Page]</main>");
}

#[tokio::test]
async fn test_override_of_outer_block_drops_nested_block() {
    let templates = [(
        "layout.yapl",
        "<main>{% block content %}[{% block title %}T{% endblock %}]{% endblock %}</main>",
    )];
    let child = "{% extends \"layout\" %}{% block content %}plain{% endblock %}";
    let rendered = render_child(&templates, child, &Vars::new()).await;
    // `title` is declared by the layout, so it is not appended either
    assert_eq!(rendered.content, "<main>plain</main>");
}

#[tokio::test]
async fn test_block_bodies_resolve_from_declaring_file() {
    let templates = [
        (
            "layouts/base.yapl",
            "{% block body %}{% endblock %}|{% include \"footer\" %}",
        ),
        ("layouts/footer.yapl", "F"),
        ("partials/hero.yapl", "H"),
        (
            "page.yapl",
            "{% extends \"layouts/base\" %}{% block body %}{% include \"partials/hero\" %}{% endblock %}",
        ),
    ];
    let rendered = memory(&templates)
        .render_file("page", &Vars::new())
        .await
        .unwrap();
    assert_eq!(rendered.content, "H|F");
    assert_eq!(
        rendered.used_files,
        vec![
            "layouts/base.yapl".to_string(),
            "layouts/footer.yapl".to_string(),
            "page.yapl".to_string(),
            "partials/hero.yapl".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_blocks_render_control_flow() {
    let templates = [("p.yapl", "{% block list %}{% endblock %}")];
    let child = "{% extends \"p\" %}{% block list %}{% for i in items %}{% if i > 1 %}{{ i }}{% endif %}{% endfor %}{% endblock %}";
    let vars = to_vars(json!({"items": [1, 2, 3]}));
    let rendered = render_child(&templates, child, &vars).await;
    assert_eq!(rendered.content, "23");
}

#[tokio::test]
async fn test_included_template_may_extend() {
    let templates = [
        ("p.yapl", "<{% block a %}P{% endblock %}>"),
        ("child.yapl", "{% extends \"p\" %}{% block a %}C{% endblock %}"),
    ];
    let rendered = render_child(&templates, "A{% include \"child\" %}B", &Vars::new()).await;
    assert_eq!(rendered.content, "A<C>B");
}

#[tokio::test]
async fn test_extends_inside_block_still_inherits() {
    let templates = [("p.yapl", "{% block a %}P{% endblock %}")];
    let template = "{% block x %}{% extends \"p\" %}body{% endblock %}";
    // The extends tag sits inside a block, but it is the first one in the
    // template, so inheritance still applies to the whole template
    let rendered = render_child(&templates, template, &Vars::new()).await;
    assert_eq!(rendered.content, "P\nbody");
}
