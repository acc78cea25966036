//! Integration tests for querying and mutating project trees
//!
//! Exercises the engine against the project backend, language views,
//! microgrammars and structural patterns together.

use pathexpr::tree::{
    ancestors, Addressed, FileArtifact, GraphNode, NodeError, NodeRef, TreeNode,
};
use pathexpr::{
    DynamicType, Engine, EngineError, EngineOptions, Language, Microgrammar, PathExpression,
    PatternType, Project, TextTreeNode, TypeProvider,
};

fn text(node: &NodeRef) -> &dyn TextTreeNode {
    node.as_text().unwrap()
}

#[test]
fn test_yaml_value_update_keeps_address() {
    let project = Project::new("music");
    project
        .add_file("bands.yml", "group:\n  value: queen\n  members: 4\n")
        .unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();
    let expr = "/bands.yml/YamlFile()/group/value";

    let value = engine.scalar(&root, expr).unwrap();
    assert_eq!(text(&value).value(), "queen");
    assert!(value.has_tag("YamlString"));
    let address = value.address();

    text(&value).update("Jefferson Airplane").unwrap();
    assert_eq!(text(&value).value(), "Jefferson Airplane");
    assert_eq!(
        project.file("bands.yml").unwrap().content(),
        "group:\n  value: Jefferson Airplane\n  members: 4\n"
    );

    let again = engine.scalar(&root, expr).unwrap();
    assert_eq!(again.address(), address);
    assert_eq!(text(&again).value(), "Jefferson Airplane");

    let members = engine
        .scalar(&root, "/bands.yml/YamlFile()/group/members")
        .unwrap();
    assert_eq!(members.property("value").as_deref(), Some("4"));
}

#[test]
fn test_yaml_update_by_file_name_attribute() {
    let project = Project::new("music");
    project
        .add_file("x.yml", "group:\n  value: queen\n")
        .unwrap();
    project.add_file("y.yml", "group:\n  value: abba\n").unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();
    let expr = "/*[@name='x.yml']/YamlFile()/group/value";

    let before = engine.evaluate(&root, expr).unwrap();
    assert_eq!(before.addresses(), vec!["/x.yml/YamlFile()/group/value"]);

    let updated = engine
        .with(&root, expr, |node: &NodeRef| -> Result<(), EngineError> {
            text(node).update("Jefferson Airplane")?;
            Ok(())
        })
        .unwrap();
    assert_eq!(updated, 1);

    let after = engine.evaluate(&root, expr).unwrap();
    assert_eq!(after.addresses(), before.addresses());
    assert_eq!(text(&after.matches[0]).value(), "Jefferson Airplane");
    assert_eq!(
        project.file("y.yml").unwrap().content(),
        "group:\n  value: abba\n"
    );
}

#[test]
fn test_repeated_yaml_keys_keep_distinct_addresses() {
    let project = Project::new("p");
    project.add_file("d.yml", "a: 1\na: 2\n\"a[1]\": 3\n").unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();

    let pairs = engine.evaluate(&root, "/d.yml/YamlFile()/*").unwrap();
    assert_eq!(
        pairs.addresses(),
        vec![
            "/d.yml/YamlFile()/a",
            "/d.yml/YamlFile()/a[1]",
            "/d.yml/YamlFile()/a%5B1%5D",
        ]
    );
    let values: Vec<Option<String>> = pairs.iter().map(|p| p.property("value")).collect();
    assert_eq!(
        values,
        vec![Some("1".into()), Some("2".into()), Some("3".into())]
    );

    text(&pairs.matches[1]).update("X").unwrap();
    assert_eq!(
        project.file("d.yml").unwrap().content(),
        "a: 1\na: X\n\"a[1]\": 3\n"
    );
}

#[test]
fn test_ancestors_walk_back_to_project_root() {
    let project = Project::new("p");
    project
        .add_file("cfg/bands.yml", "group:\n  value: queen\n")
        .unwrap();
    project
        .add_file("pom.xml", "<artifactId>guava</artifactId>\n")
        .unwrap();
    let mut engine = Engine::with_defaults();
    engine.add_type(
        Microgrammar::new(
            "Dependency",
            "<artifactId>$artifact</artifactId>",
            [("artifact", "[a-z]+")],
        )
        .unwrap(),
    );
    let root = project.root();

    let chain = |node: &NodeRef| -> Vec<String> {
        let aware = node.as_parent_aware().unwrap();
        ancestors(aware).iter().map(|n| n.address()).collect()
    };

    let value = engine
        .scalar(&root, "/cfg/bands.yml/YamlFile()/group/value")
        .unwrap();
    assert_eq!(
        chain(&value),
        vec![
            "/cfg/bands.yml/YamlFile()/group",
            "/cfg/bands.yml/YamlFile()",
            "/cfg/bands.yml",
            "/cfg",
            "/",
        ]
    );

    let artifact = engine
        .scalar(&root, "/pom.xml/Dependency()/artifact")
        .unwrap();
    assert_eq!(
        chain(&artifact),
        vec!["/pom.xml/Dependency()", "/pom.xml", "/"]
    );

    // Each parent lists the child it was reached from. Views hang off a
    // file without being one of its structural children.
    for node in [value, artifact] {
        let chain = ancestors(node.as_parent_aware().unwrap());
        let mut child = node;
        for parent in chain {
            assert_ne!(parent.address(), child.address());
            if parent.as_file().is_none() {
                assert!(parent
                    .children()
                    .iter()
                    .any(|c| c.address() == child.address()));
            }
            child = parent;
        }
        assert_eq!(child.address(), "/");
        assert!(child.as_parent_aware().and_then(|p| p.parent()).is_none());
    }
}

#[test]
fn test_container_update_refreshes_descendants_and_positions() {
    let project = Project::new("crate");
    project
        .add_file(
            "src/main.rs",
            "fn main() {\n    a();\n}\n\nfn tail() {}\n",
        )
        .unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();

    let main = engine
        .scalar(&root, "//RustFile()//function_item[@identifier='main']")
        .unwrap();
    assert_eq!(engine.evaluate(&main, "//call_expression").unwrap().len(), 1);
    let tail = engine
        .scalar(&root, "//RustFile()//function_item[@identifier='tail']")
        .unwrap();
    let tail_before = text(&tail).format_info().unwrap();
    assert_eq!(tail_before.start.offset, 24);
    assert_eq!(tail_before.start.line_number_from1, 5);

    text(&main)
        .update("fn main() {\n    a();\n    b();\n    c();\n}")
        .unwrap();

    let calls = engine.evaluate(&main, "//call_expression").unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(text(&calls.matches[2]).value(), "c()");

    let tail = engine
        .scalar(&root, "//RustFile()//function_item[@identifier='tail']")
        .unwrap();
    let tail_after = text(&tail).format_info().unwrap();
    assert_eq!(tail_after.start.offset, 42);
    assert_eq!(tail_after.start.line_number_from1, 7);
    assert_eq!(tail_after.start.column_number_from1, 1);
    assert_eq!(text(&main).format_info().unwrap().start.offset, 0);
}

#[test]
fn test_replace_in_every_file_keeps_match_count() {
    let project = Project::new("p");
    project.add_file("a.txt", "foo one").unwrap();
    project.add_file("dir/b.txt", "two foo").unwrap();
    project.add_file("dir/sub/c.txt", "foo foo").unwrap();
    let engine = Engine::new();
    let root = project.root();

    let before = engine.evaluate(&root, "//File()").unwrap();
    assert_eq!(
        before.addresses(),
        vec!["/a.txt", "/dir/b.txt", "/dir/sub/c.txt"]
    );

    let count = engine
        .with(&root, "//File()", |node: &NodeRef| -> Result<(), EngineError> {
            let file = node.clone().into_file().unwrap();
            file.replace("foo", "bar")?;
            Ok(())
        })
        .unwrap();
    assert_eq!(count, 3);

    let after = engine.evaluate(&root, "//File()").unwrap();
    assert_eq!(after.len(), 3);
    assert!(after
        .iter()
        .all(|node| !node.clone().into_file().unwrap().contains("foo")));
    assert_eq!(project.dirty_files().len(), 3);
}

#[test]
fn test_with_stops_at_first_callback_error() {
    let project = Project::new("p");
    for name in ["a.txt", "b.txt", "c.txt"] {
        project.add_file(name, "old").unwrap();
    }
    let engine = Engine::new();

    let mut calls = 0;
    let result = engine.with(&project.root(), "/File()", |node: &NodeRef| {
        calls += 1;
        if node.node_name() == "b.txt" {
            anyhow::bail!("refusing to touch {}", node.address());
        }
        text(node).update("new")?;
        Ok(())
    });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("/b.txt"));
    assert_eq!(calls, 2);
    assert_eq!(project.file("a.txt").unwrap().content(), "new");
    assert_eq!(project.file("b.txt").unwrap().content(), "old");
    assert_eq!(project.file("c.txt").unwrap().content(), "old");
}

#[test]
fn test_add_type_makes_name_resolvable() {
    let project = Project::new("p");
    project
        .add_file("pom.xml", "<artifactId>guava</artifactId>")
        .unwrap();
    let mut engine = Engine::new();

    let err = engine
        .evaluate(&project.root(), "/pom.xml/Dependency()")
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownType { ref name, .. } if name == "Dependency"));

    engine.add_type(
        Microgrammar::new(
            "Dependency",
            "<artifactId>$artifact</artifactId>",
            [("artifact", "[a-z][a-z0-9\\-]*")],
        )
        .unwrap(),
    );
    let found = engine
        .evaluate(&project.root(), "/pom.xml/Dependency()/artifact")
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(text(&found.matches[0]).value(), "guava");
}

#[test]
fn test_later_registration_wins() {
    let project = Project::new("p");
    project.add_file("notes.txt", "key=value\nname: thing\n").unwrap();
    let mut engine = Engine::new();
    engine
        .add_type(Microgrammar::new("Pair", "$k=$v", Vec::<(String, String)>::new()).unwrap())
        .add_type(Microgrammar::new("Pair", "$k: $v", Vec::<(String, String)>::new()).unwrap());

    let found = engine
        .evaluate(&project.root(), "/notes.txt/Pair()")
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(text(&found.matches[0]).value(), "name: thing");
}

#[test]
fn test_microgrammar_match_update_refreshes_children() {
    let project = Project::new("p");
    project
        .add_file(
            "pom.xml",
            "<artifactId>guava</artifactId>\n<artifactId>junit</artifactId>\n",
        )
        .unwrap();
    let mut engine = Engine::new();
    engine.add_type(
        Microgrammar::new(
            "Dependency",
            "<artifactId>$artifact</artifactId>",
            [("artifact", "[a-z][a-z0-9\\-]*")],
        )
        .unwrap(),
    );
    let root = project.root();

    let second = engine.scalar(&root, "/pom.xml/Dependency()[2]").unwrap();
    assert_eq!(second.address(), "/pom.xml/Dependency()[1]");
    text(&second)
        .update("<artifactId>jackson-core</artifactId>")
        .unwrap();

    let artifact = engine.children(&second, "artifact");
    assert_eq!(artifact.len(), 1);
    assert_eq!(text(&artifact[0]).value(), "jackson-core");

    let first_artifact = engine
        .scalar(&root, "/pom.xml/Dependency()[1]/artifact")
        .unwrap();
    text(&first_artifact).update("guava-testlib").unwrap();
    assert_eq!(
        project.file("pom.xml").unwrap().content(),
        "<artifactId>guava-testlib</artifactId>\n<artifactId>jackson-core</artifactId>\n"
    );
}

#[test]
fn test_rust_view_function_by_identifier() {
    let project = Project::new("crate");
    project
        .add_file(
            "src/main.rs",
            "fn helper() -> u32 {\n    1\n}\n\nfn main() {\n    helper();\n}\n",
        )
        .unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();

    let main = engine
        .scalar(&root, "//RustFile()//function_item[@identifier='main']")
        .unwrap();
    assert!(main.has_tag("RustNode"));
    assert_eq!(main.property("kind").as_deref(), Some("function_item"));
    assert!(text(&main).value().starts_with("fn main()"));
    let info = text(&main).format_info().unwrap();
    assert_eq!(info.start.line_number_from1, 5);

    text(&main).update("fn main() {}").unwrap();
    assert_eq!(
        project.file("src/main.rs").unwrap().content(),
        "fn helper() -> u32 {\n    1\n}\n\nfn main() {}\n"
    );

    let functions = engine.evaluate(&root, "//RustFile()//function_item").unwrap();
    assert_eq!(functions.len(), 2);
}

#[test]
fn test_structural_pattern_type() {
    let project = Project::new("crate");
    project
        .add_file(
            "lib.rs",
            "fn load() {\n    let a = read().unwrap();\n    let b = parse(a).unwrap();\n}\n",
        )
        .unwrap();
    project.add_file("notes.txt", "x.unwrap()").unwrap();
    let mut engine = Engine::with_defaults();
    engine.add_type(DynamicType::provider(PatternType::new(
        "UnwrapCall",
        Language::Rust,
        "$EXPR.unwrap()",
    )));
    let root = project.root();

    let found = engine.evaluate(&root, "/File()/UnwrapCall()").unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(text(&found.matches[0]).value(), "read().unwrap()");

    text(&found.matches[0]).update("read()?").unwrap();
    let remaining = engine.evaluate(&root, "/File()/UnwrapCall()").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(text(&remaining.matches[0]).value(), "parse(a).unwrap()");
}

#[test]
fn test_dedupe_by_address_is_opt_in() {
    let project = Project::new("p");
    project.add_file("d/x.txt", "x").unwrap();
    let root = project.root();

    let plain = Engine::new().evaluate(&root, "//*//x.txt").unwrap();
    assert_eq!(plain.len(), 3);

    let engine = Engine::new().with_options(EngineOptions {
        dedupe_by_address: true,
    });
    let deduped = engine.evaluate(&root, "//*//x.txt").unwrap();
    assert_eq!(deduped.addresses(), vec!["/d/x.txt"]);
}

#[test]
fn test_positional_predicate_applies_per_context() {
    let project = Project::new("p");
    project.add_file("d1/a.txt", "").unwrap();
    project.add_file("d1/b.txt", "").unwrap();
    project.add_file("d2/c.txt", "").unwrap();
    project.add_file("d2/d.txt", "").unwrap();
    let engine = Engine::new();
    let root = project.root();

    let firsts = engine.evaluate(&root, "//Directory()/*[1]").unwrap();
    assert_eq!(firsts.addresses(), vec!["/d1/a.txt", "/d2/c.txt"]);

    let none = engine.evaluate(&root, "//Directory()/*[3]").unwrap();
    assert!(none.is_empty());

    let with_child = engine.evaluate(&root, "/*[d.txt]").unwrap();
    assert_eq!(with_child.addresses(), vec!["/d2"]);
}

#[test]
fn test_cast_to_dynamic_view() {
    let project = Project::new("p");
    project.add_file("a.yml", "k: v\n").unwrap();
    project.add_file("b.txt", "k: v\n").unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();

    let yaml = engine.scalar(&root, "/a.yml").unwrap();
    let view = engine.cast(&yaml, "YamlFile").unwrap();
    assert_eq!(view.address(), "/a.yml/YamlFile()");
    assert!(view.has_tag("YamlFile"));

    let plain = engine.scalar(&root, "/b.txt").unwrap();
    assert!(matches!(
        engine.cast(&plain, "YamlFile"),
        Err(EngineError::InvalidCast { .. })
    ));

    let file: std::rc::Rc<dyn FileArtifact> = engine.cast_as(&plain).unwrap();
    assert_eq!(file.path(), "b.txt");
}

#[test]
fn test_typed_path_expression() {
    let project = Project::new("p");
    project.add_file("a.txt", "alpha").unwrap();
    let engine = Engine::new();

    let expr: PathExpression<NodeRef, std::rc::Rc<dyn FileArtifact>> =
        PathExpression::new("//File()");
    let found = engine.evaluate(&project.root(), &expr).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.matches[0].content(), "alpha");
}

/// Provider defined outside the crate: every text file whose content is
/// non-empty, viewed as itself.
struct NonEmpty;

impl TypeProvider for NonEmpty {
    fn type_name(&self) -> &str {
        "NonEmpty"
    }

    fn find(&self, context: &NodeRef) -> Result<Vec<NodeRef>, NodeError> {
        Ok(context
            .children()
            .into_iter()
            .filter(|child| child.as_text().is_some_and(|t| !t.value().is_empty()))
            .collect())
    }
}

#[test]
fn test_external_provider() {
    let project = Project::new("p");
    project.add_file("empty.txt", "").unwrap();
    project.add_file("full.txt", "data").unwrap();
    let mut engine = Engine::new();
    engine.add_type(DynamicType::provider(NonEmpty));

    let found = engine.evaluate(&project.root(), "/NonEmpty()").unwrap();
    assert_eq!(found.addresses(), vec!["/full.txt"]);
    assert!(engine.registry().type_names().contains(&"NonEmpty".to_string()));
}

#[test]
fn test_stale_view_node_refuses_update() {
    let project = Project::new("p");
    project.add_file("a.yml", "a: 1\nb: 2\n").unwrap();
    let engine = Engine::with_defaults();
    let root = project.root();

    let b = engine.scalar(&root, "/a.yml/YamlFile()/b").unwrap();
    project
        .file("a.yml")
        .unwrap()
        .set_content("a: 1\n")
        .unwrap();

    assert_eq!(text(&b).value(), "2");
    let err = text(&b).update("3").unwrap_err();
    assert!(matches!(err, NodeError::Stale { .. }));
}
