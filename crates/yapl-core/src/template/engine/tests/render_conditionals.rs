//! Conditional rendering tests for template engine

use super::helpers::{render, to_vars};
use super::*;
use serde_json::json;

const GRADES: &str = "{% if score >= 90 %}A{% elseif score >= 80 %}B{% else %}F{% endif %}";

#[tokio::test]
async fn test_render_if_elseif_else() {
    for (score, expected) in [(95, "A"), (85, "B"), (10, "F")] {
        let vars = to_vars(json!({ "score": score }));
        assert_eq!(render(GRADES, &vars).await, expected, "score {}", score);
    }
}

#[tokio::test]
async fn test_render_elseif_chain_evaluates_every_clause() {
    let template = "{% if n == 1 %}one{% elseif n == 2 %}two{% elseif n == 3 %}three{% else %}many{% endif %}";
    let cases = [(1, "one"), (2, "two"), (3, "three"), (7, "many")];
    for (n, expected) in cases {
        let vars = to_vars(json!({ "n": n }));
        assert_eq!(render(template, &vars).await, expected);
    }
}

#[tokio::test]
async fn test_render_false_without_else_is_empty() {
    assert_eq!(render("x{% if false %}y{% endif %}z", &Vars::new()).await, "xz");
    assert_eq!(
        render("x{% if missing %}y{% elseif also.missing %}w{% endif %}z", &Vars::new()).await,
        "xz"
    );
}

#[tokio::test]
async fn test_render_nested_conditionals() {
    let template = "{% if a %}[{% if b %}AB{% else %}A{% endif %}]{% else %}none{% endif %}";
    let cases = [
        (json!({"a": true, "b": true}), "[AB]"),
        (json!({"a": true, "b": false}), "[A]"),
        (json!({"a": false, "b": true}), "none"),
    ];
    for (vars, expected) in cases {
        assert_eq!(render(template, &to_vars(vars)).await, expected);
    }
}

#[tokio::test]
async fn test_render_condition_forms() {
    let vars = to_vars(json!({
        "user": {"role": "admin", "active": true, "name": "Ada"},
        "items": [],
        "count": "12",
        "nothing": null
    }));
    let cases = [
        ("{% if user.role == \"admin\" and user.active %}yes{% endif %}", "yes"),
        ("{% if user.role != 'admin' or count > 10 %}yes{% endif %}", "yes"),
        ("{% if user.name is defined %}yes{% endif %}", "yes"),
        ("{% if nothing is defined %}yes{% else %}no{% endif %}", "no"),
        ("{% if nothing is not defined %}yes{% endif %}", "yes"),
        ("{% if items is empty %}yes{% endif %}", "yes"),
        ("{% if items is not empty %}yes{% else %}no{% endif %}", "no"),
        // Empty arrays are truthy even though they are empty
        ("{% if items %}yes{% endif %}", "yes"),
        ("{% if count == 12 %}yes{% else %}no{% endif %}", "no"),
        ("{% if count >= 12 %}yes{% endif %}", "yes"),
        ("{% if user.name > 1 %}yes{% else %}no{% endif %}", "no"),
        ("{% if not user.active %}yes{% else %}no{% endif %}", "no"),
    ];
    for (template, expected) in cases {
        assert_eq!(render(template, &vars).await, expected, "{}", template);
    }
}

#[tokio::test]
async fn test_render_branch_uses_outer_vars() {
    let vars = to_vars(json!({"show": true, "name": "Ada"}));
    let template = "{% if show %}Hello {{ name }}{% endif %}";
    assert_eq!(render(template, &vars).await, "Hello Ada");
}

#[tokio::test]
async fn test_render_branch_body_dedented() {
    let template = "{% if true %}\n    line1\n      line2\n{% endif %}";
    assert_eq!(render(template, &Vars::new()).await, "line1\n  line2");
}

#[tokio::test]
async fn test_render_empty_elseif_is_literal() {
    let template = "{% if false %}A{% elseif %}B{% else %}C{% endif %}";
    assert_eq!(render(template, &Vars::new()).await, "C");

    let template = "{% if true %}X{% elseif %}Y{% else %}Z{% endif %}";
    assert_eq!(render(template, &Vars::new()).await, "X{% elseif %}Y");
}

#[tokio::test]
async fn test_render_second_else_is_literal() {
    let template = "{% if false %}A{% else %}B{% else %}C{% endif %}";
    assert_eq!(render(template, &Vars::new()).await, "B{% else %}C");
}

#[tokio::test]
async fn test_render_unmatched_if_left_verbatim() {
    let template = "{% if true %}never closed";
    assert_eq!(render(template, &Vars::new()).await, template);
}

#[tokio::test]
async fn test_render_trailing_unmatched_if_fails_open() {
    // The second opener has no closer and stays as text
    let template = "{% if a %}x{% endif %}{% if b %}y";
    let vars = to_vars(json!({"a": true, "b": true}));
    assert_eq!(render(template, &vars).await, "x{% if b %}y");
}
