//! End-to-end bundling pipeline tests
//!
//! Each test builds a small in-memory project, runs a full session, and
//! checks the properties the bundle must satisfy: uniqueness of final
//! names, completeness of the reachable set, cycle termination, namespace
//! flattening, locality-aware reference rewriting, alias propagation, and
//! byte-level determinism.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use typack::{
    BundleConfig, BundleError, BundlingSession, WarningReason,
    collision::CollisionResolver,
    decl_index::{DeclarationRecord, FileDeclarations, ImportEdge, ImportStyle, ProjectIndex},
    resolver::ProjectResolver,
    rewriter::ReferenceRewriter,
    types::{DeclKey, DeclKind, FxIndexMap},
    walker::CollectedDeclaration,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn decl(file: &str, name: &str, kind: DeclKind, text: &str, refs: &[&str]) -> DeclarationRecord {
    DeclarationRecord::new(file, name, kind, text).with_references(refs.iter().copied())
}

fn named_import(from: &str, local: &str, exported: &str, specifier: &str) -> ImportEdge {
    ImportEdge {
        from_file: PathBuf::from(from),
        local_identifier: local.to_string(),
        exported_name: exported.to_string(),
        import_style: ImportStyle::Named,
        module_specifier: specifier.to_string(),
    }
}

fn namespace_import(from: &str, binding: &str, specifier: &str) -> ImportEdge {
    ImportEdge {
        from_file: PathBuf::from(from),
        local_identifier: binding.to_string(),
        exported_name: binding.to_string(),
        import_style: ImportStyle::Namespace,
        module_specifier: specifier.to_string(),
    }
}

fn file_with(records: Vec<DeclarationRecord>, imports: Vec<ImportEdge>) -> FileDeclarations {
    let mut file = FileDeclarations::new();
    for record in records {
        file.declarations.insert(record.name.clone(), record);
    }
    file.import_edges = imports;
    file
}

fn project(files: Vec<(&str, FileDeclarations)>) -> (ProjectIndex, ProjectResolver) {
    let mut index = ProjectIndex::new();
    let mut resolver = ProjectResolver::new();
    for (path, decls) in files {
        resolver.add_file(path);
        index.add_file(path, decls);
    }
    (index, resolver)
}

#[test]
fn collision_group_yields_unique_final_names() {
    init_logs();
    // Three files declare `Config`; the entry reaches all of them.
    let (index, resolver) = project(vec![
        (
            "src/root.ts",
            file_with(
                vec![decl(
                    "src/root.ts",
                    "Root",
                    DeclKind::TypeAlias,
                    "type Root = { a: AThing; b: BThing };",
                    &["AThing", "BThing"],
                )],
                vec![
                    named_import("src/root.ts", "AThing", "AThing", "./a"),
                    named_import("src/root.ts", "BThing", "BThing", "./b"),
                ],
            ),
        ),
        (
            "src/a.ts",
            file_with(
                vec![
                    decl(
                        "src/a.ts",
                        "AThing",
                        DeclKind::TypeAlias,
                        "type AThing = { c: Config };",
                        &["Config"],
                    ),
                    decl("src/a.ts", "Config", DeclKind::Interface, "interface Config {}", &[]),
                ],
                vec![],
            ),
        ),
        (
            "src/b.ts",
            file_with(
                vec![
                    decl(
                        "src/b.ts",
                        "BThing",
                        DeclKind::TypeAlias,
                        "type BThing = { c: Config };",
                        &["Config"],
                    ),
                    decl("src/b.ts", "Config", DeclKind::Interface, "interface Config {}", &[]),
                ],
                vec![],
            ),
        ),
    ]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/root.ts"), "Root")
        .expect("bundle should succeed");

    let configs: Vec<_> = output
        .entries
        .iter()
        .filter(|entry| entry.original_name == "Config")
        .collect();
    assert_eq!(configs.len(), 2);
    assert_ne!(configs[0].final_name, configs[1].final_name);
    assert_eq!(
        configs
            .iter()
            .filter(|entry| entry.final_name == "Config")
            .count(),
        1
    );
}

#[test]
fn reachable_set_is_complete_and_collected_once() {
    let (index, resolver) = project(vec![
        (
            "src/index.ts",
            file_with(
                vec![decl(
                    "src/index.ts",
                    "Api",
                    DeclKind::Interface,
                    "interface Api { user: User; role: Role; }",
                    &["User", "Role"],
                )],
                vec![
                    named_import("src/index.ts", "User", "User", "./models"),
                    named_import("src/index.ts", "Role", "Role", "./models"),
                ],
            ),
        ),
        (
            "src/models.ts",
            file_with(
                vec![
                    decl(
                        "src/models.ts",
                        "User",
                        DeclKind::Interface,
                        "interface User { role: Role; }",
                        &["Role"],
                    ),
                    decl("src/models.ts", "Role", DeclKind::Enum, "enum Role { Admin, Guest }", &[]),
                ],
                vec![],
            ),
        ),
    ]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/index.ts"), "Api")
        .expect("bundle should succeed");

    // Api, User, Role: each exactly once although Role is reachable twice
    assert_eq!(output.entries.len(), 3);
    let names: Vec<&str> = output
        .entries
        .iter()
        .map(|entry| entry.original_name.as_str())
        .collect();
    assert!(names.contains(&"Api"));
    assert!(names.contains(&"User"));
    assert!(names.contains(&"Role"));
    assert!(output.warnings.is_empty());
}

#[test]
fn recursive_type_bundles_to_one_entry_and_terminates() {
    let (index, resolver) = project(vec![(
        "src/tree.ts",
        file_with(
            vec![decl(
                "src/tree.ts",
                "Tree",
                DeclKind::TypeAlias,
                "type Tree = { children: Tree[] };",
                &["Tree"],
            )],
            vec![],
        ),
    )]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/tree.ts"), "Tree")
        .expect("bundle should succeed");

    assert_eq!(output.entries.len(), 1);
    assert!(output.had_cycles);
    assert!(output.text.contains("type Tree = { children: Tree[] };"));
}

#[test]
fn collision_resolution_is_idempotent_on_a_clean_bundle() {
    // A bundle that is already collision-free, treated as a single
    // synthetic input: resolving and rewriting again changes nothing.
    let mut collected: FxIndexMap<DeclKey, CollectedDeclaration> = FxIndexMap::default();
    for (name, text) in [
        ("Config", "interface Config { level: Level; }"),
        ("Config_b", "interface Config_b {}"),
        ("Level", "enum Level { Info }"),
    ] {
        collected.insert(
            DeclKey::new("bundle.ts", name),
            CollectedDeclaration {
                record: DeclarationRecord::new("bundle.ts", name, DeclKind::Interface, text),
                rename_hint: None,
            },
        );
    }

    let assignment = CollisionResolver::new(&collected)
        .resolve(&BundleConfig::default())
        .expect("resolution should succeed");
    let rewriter = ReferenceRewriter::new(&assignment, &[]);

    for (key, declaration) in &collected {
        assert_eq!(assignment.final_name(key), key.name, "no further renames");
        assert_eq!(
            rewriter.rewrite(key, declaration),
            declaration.record.raw_text,
            "no text changes"
        );
    }
}

#[test]
fn namespace_access_is_flattened_in_referencer_and_member() {
    init_logs();
    let (index, resolver) = project(vec![
        (
            "src/index.ts",
            file_with(
                vec![decl(
                    "src/index.ts",
                    "X",
                    DeclKind::TypeAlias,
                    "type X = NS.Foo;",
                    &["NS.Foo"],
                )],
                vec![namespace_import("src/index.ts", "NS", "./m")],
            ),
        ),
        (
            "src/m.ts",
            file_with(
                vec![decl("src/m.ts", "Foo", DeclKind::Interface, "interface Foo {}", &[])],
                vec![],
            ),
        ),
    ]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/index.ts"), "X")
        .expect("bundle should succeed");

    let x = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "X")
        .expect("X should be bundled");
    assert_eq!(x.rewritten_text, "type X = NS_Foo;");
    assert!(!x.rewritten_text.contains("NS.Foo"));

    let foo = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "Foo")
        .expect("Foo should be bundled");
    assert_eq!(foo.final_name, "NS_Foo");
    assert_eq!(foo.rewritten_text, "interface NS_Foo {}");
}

#[test]
fn locality_prefers_same_file_then_bare_name_keeper() {
    let (index, resolver) = project(vec![
        (
            "src/c.ts",
            file_with(
                vec![
                    decl(
                        "src/c.ts",
                        "Root",
                        DeclKind::TypeAlias,
                        "type Root = { a: UsesA; b: BThing };",
                        &["UsesA", "BThing"],
                    ),
                    decl(
                        "src/c.ts",
                        "UsesA",
                        DeclKind::TypeAlias,
                        "type UsesA = { c: Config };",
                        &["Config"],
                    ),
                ],
                vec![
                    named_import("src/c.ts", "Config", "Config", "./a"),
                    named_import("src/c.ts", "BThing", "BThing", "./b"),
                ],
            ),
        ),
        (
            "src/a.ts",
            file_with(
                vec![decl(
                    "src/a.ts",
                    "Config",
                    DeclKind::Interface,
                    "interface Config { fromA: boolean; }",
                    &[],
                )],
                vec![],
            ),
        ),
        (
            "src/b.ts",
            file_with(
                vec![
                    decl(
                        "src/b.ts",
                        "BThing",
                        DeclKind::TypeAlias,
                        "type BThing = { c: Config };",
                        &["Config"],
                    ),
                    decl(
                        "src/b.ts",
                        "Config",
                        DeclKind::Interface,
                        "interface Config { fromB: boolean; }",
                        &[],
                    ),
                ],
                vec![],
            ),
        ),
    ]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/c.ts"), "Root")
        .expect("bundle should succeed");

    // a.ts sorts before b.ts: A's Config keeps the bare name
    let b_config = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "Config" && entry.file_path == Path::new("src/b.ts"))
        .expect("B's Config should be bundled");
    assert_eq!(b_config.final_name, "Config_b");

    // UsesA imports Config from A only; its text keeps the bare name
    let uses_a = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "UsesA")
        .expect("UsesA should be bundled");
    assert_eq!(uses_a.rewritten_text, "type UsesA = { c: Config };");

    // BThing lives next to B's Config; its reference follows the rename
    let b_thing = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "BThing")
        .expect("BThing should be bundled");
    assert_eq!(b_thing.rewritten_text, "type BThing = { c: Config_b };");
}

#[test]
fn import_alias_propagates_into_emitted_header() {
    let (index, resolver) = project(vec![
        (
            "src/index.ts",
            file_with(
                vec![decl(
                    "src/index.ts",
                    "X",
                    DeclKind::TypeAlias,
                    "type X = Bar;",
                    &["Bar"],
                )],
                vec![named_import("src/index.ts", "Bar", "Foo", "./m")],
            ),
        ),
        (
            "src/m.ts",
            file_with(
                vec![decl("src/m.ts", "Foo", DeclKind::Interface, "interface Foo {}", &[])],
                vec![],
            ),
        ),
    ]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/index.ts"), "X")
        .expect("bundle should succeed");

    let foo = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "Foo")
        .expect("Foo should be bundled");
    assert_eq!(foo.final_name, "Bar");
    assert_eq!(foo.rewritten_text, "interface Bar {}");

    let x = output
        .entries
        .iter()
        .find(|entry| entry.original_name == "X")
        .expect("X should be bundled");
    assert_eq!(x.rewritten_text, "type X = Bar;");
}

#[test]
fn external_package_import_yields_warning_and_partial_bundle() {
    let (index, resolver) = project(vec![(
        "src/index.ts",
        file_with(
            vec![
                decl(
                    "src/index.ts",
                    "Api",
                    DeclKind::Interface,
                    "interface Api { stream: Observable<string>; config: Config; }",
                    &["Observable", "Config"],
                ),
                decl("src/index.ts", "Config", DeclKind::Interface, "interface Config {}", &[]),
            ],
            vec![named_import("src/index.ts", "Observable", "Observable", "rxjs")],
        ),
    )]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/index.ts"), "Api")
        .expect("bundle should succeed");

    assert_eq!(output.entries.len(), 2);
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(
        output.warnings[0].reason,
        WarningReason::ExternalPackage {
            package: "rxjs".to_string()
        }
    );
    // The external reference is left as written
    assert!(output.text.contains("Observable<string>"));
}

#[test]
fn missing_entry_point_is_fatal() {
    let (index, resolver) = project(vec![(
        "src/index.ts",
        file_with(vec![], vec![]),
    )]);

    let err = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/index.ts"), "Ghost")
        .expect_err("empty walk must fail");
    assert!(matches!(err, BundleError::EntryNotFound { .. }));
}

#[test]
fn prefer_entry_name_keeps_entry_bare() {
    // The entry `Config` in z.ts reaches a second `Config` in a.ts through
    // the unaliased `Wrapper` chain.
    let files = || {
        vec![
            (
                "src/z.ts",
                file_with(
                    vec![decl(
                        "src/z.ts",
                        "Config",
                        DeclKind::Interface,
                        "interface Config { entry: boolean; w: Wrapper; }",
                        &["Wrapper"],
                    )],
                    vec![named_import("src/z.ts", "Wrapper", "Wrapper", "./a")],
                ),
            ),
            (
                "src/a.ts",
                file_with(
                    vec![
                        decl(
                            "src/a.ts",
                            "Wrapper",
                            DeclKind::Interface,
                            "interface Wrapper { c: Config; }",
                            &["Config"],
                        ),
                        decl(
                            "src/a.ts",
                            "Config",
                            DeclKind::Interface,
                            "interface Config { fromA: boolean; }",
                            &[],
                        ),
                    ],
                    vec![],
                ),
            ),
        ]
    };

    // Default policy: path order decides, a.ts wins the bare name
    let (index, resolver) = project(files());
    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/z.ts"), "Config")
        .expect("bundle should succeed");
    let entry_decl = output
        .entries
        .iter()
        .find(|entry| entry.file_path == Path::new("src/z.ts"))
        .expect("entry should be bundled");
    assert_eq!(entry_decl.final_name, "Config_z");

    // Entry-wins policy: the requested type never gets renamed
    let (index, resolver) = project(files());
    let config = BundleConfig {
        prefer_entry_name: true,
        ..BundleConfig::default()
    };
    let output = BundlingSession::with_config(&index, &resolver, config)
        .bundle(Path::new("src/z.ts"), "Config")
        .expect("bundle should succeed");
    let entry_decl = output
        .entries
        .iter()
        .find(|entry| entry.file_path == Path::new("src/z.ts"))
        .expect("entry should be bundled");
    assert_eq!(entry_decl.final_name, "Config");
    let other = output
        .entries
        .iter()
        .find(|entry| entry.file_path == Path::new("src/a.ts"))
        .expect("other member should be bundled");
    assert_eq!(other.final_name, "Config_a");
}

#[test]
fn identical_projects_produce_identical_bytes() {
    let build = |reversed: bool| {
        let mut files = vec![
            (
                "src/index.ts",
                file_with(
                    vec![decl(
                        "src/index.ts",
                        "Api",
                        DeclKind::Interface,
                        "interface Api { user: User; }",
                        &["User"],
                    )],
                    vec![named_import("src/index.ts", "User", "User", "./models")],
                ),
            ),
            (
                "src/models.ts",
                file_with(
                    vec![decl(
                        "src/models.ts",
                        "User",
                        DeclKind::Interface,
                        "interface User { name: string; }",
                        &[],
                    )],
                    vec![],
                ),
            ),
        ];
        if reversed {
            files.reverse();
        }
        let (index, resolver) = project(files);
        BundlingSession::new(&index, &resolver)
            .bundle(Path::new("src/index.ts"), "Api")
            .expect("bundle should succeed")
            .text
    };

    assert_eq!(build(false), build(true));
}

#[test]
fn full_artifact_shape() {
    let (index, resolver) = project(vec![(
        "src/api.ts",
        file_with(
            vec![
                decl(
                    "src/api.ts",
                    "Api",
                    DeclKind::Interface,
                    "interface Api { level: Level; }",
                    &["Level"],
                ),
                decl("src/api.ts", "Level", DeclKind::Enum, "enum Level { Info, Warn }", &[]),
            ],
            vec![],
        ),
    )]);

    let output = BundlingSession::new(&index, &resolver)
        .bundle(Path::new("src/api.ts"), "Api")
        .expect("bundle should succeed");

    let expected = "\
// ===== Enums =====

// Level (from src/api.ts)
enum Level { Info, Warn }

// ===== Interfaces =====

// Api (from src/api.ts)
interface Api { level: Level; }
";
    assert_eq!(output.text, expected);
}
