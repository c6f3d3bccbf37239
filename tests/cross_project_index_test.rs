//! Table usages seen across the project dependency graph.

use std::sync::Arc;

use modelindex::project::{MemoryProject, MemorySourceFile};
use modelindex::{ChangeBatch, DependencyEdge, ModelIndex, ObjectType, Project, Settings};

fn model_index() -> ModelIndex {
    ModelIndex::new(Arc::new(Settings::default()))
}

fn project(index: &ModelIndex, id: &str, edges: &[(&str, bool)]) -> Arc<MemoryProject> {
    let project = MemoryProject::new(id);
    project.set_dependencies(
        edges
            .iter()
            .map(|(target, reexported)| DependencyEdge::new(*target, *reexported))
            .collect(),
    );
    index.add_project(project.clone());
    project
}

fn table_contents(project: &MemoryProject, name: &str, structure: &str) -> Arc<MemorySourceFile> {
    let file = project.new_file(name, ObjectType::TableContents);
    file.set_property("tableStructure", structure);
    file
}

#[test]
fn test_reexported_dependency_is_visible() {
    let index = model_index();
    let a = project(&index, "a", &[]);
    let c = project(&index, "c", &[("a", true)]);
    let rates = table_contents(&a, "tables.Rates", "myTableStructure");

    let found = index.find_table_usages(c.id(), "myTableStructure").unwrap();

    assert_eq!(found, vec![rates.handle()]);
    assert!(
        index
            .find_local_table_usages(c.id(), "myTableStructure")
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_non_reexported_dependency_is_hidden() {
    let index = model_index();
    let a = project(&index, "a", &[]);
    let c = project(&index, "c", &[("a", false)]);
    assert!(
        index
            .find_table_usages(c.id(), "myTableStructure")
            .unwrap()
            .is_empty()
    );
    assert!(
        index
            .find_table_usages(a.id(), "myTableStructure")
            .unwrap()
            .is_empty()
    );

    let rates = table_contents(&a, "tables.Rates", "myTableStructure");
    index.apply_changes(&ChangeBatch::new().added(rates.clone()));

    assert_eq!(
        index.find_table_usages(a.id(), "myTableStructure").unwrap(),
        vec![rates.handle()]
    );
    assert_eq!(
        index
            .find_local_table_usages(a.id(), "myTableStructure")
            .unwrap(),
        vec![rates.handle()]
    );
    assert!(
        index
            .find_table_usages(c.id(), "myTableStructure")
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_added_file_reaches_transitive_viewers() {
    let index = model_index();
    let base = project(&index, "base", &[]);
    let mid = project(&index, "mid", &[("base", true)]);
    let top = project(&index, "top", &[("mid", true)]);
    let side = project(&index, "side", &[("mid", false)]);
    for p in [&base, &mid, &top, &side] {
        index.find_table_usages(p.id(), "Rates").unwrap();
    }
    let builds = index.stats().table_usage_aggregates.build_count;

    let rates = table_contents(&base, "tables.Rates", "Rates");
    let stats = index.apply_changes(&ChangeBatch::new().added(rates.clone()));

    assert_eq!(stats.applied, 1);
    for p in [&base, &mid, &top] {
        assert_eq!(
            index.find_table_usages(p.id(), "Rates").unwrap(),
            vec![rates.handle()],
            "{} should see base",
            p.id()
        );
    }
    assert!(index.find_table_usages(side.id(), "Rates").unwrap().is_empty());
    // Patched in place, nothing recollected
    assert_eq!(index.stats().table_usage_aggregates.build_count, builds);
}

#[test]
fn test_deletion_propagates_downstream() {
    let index = model_index();
    let base = project(&index, "base", &[]);
    let mid = project(&index, "mid", &[("base", true)]);
    let top = project(&index, "top", &[("mid", true)]);
    let rates = table_contents(&base, "tables.Rates", "Rates");
    let local = table_contents(&top, "tables.TopRates", "Rates");
    assert_eq!(index.find_table_usages(top.id(), "Rates").unwrap().len(), 2);
    assert_eq!(index.find_table_usages(mid.id(), "Rates").unwrap().len(), 1);

    base.delete_file("tables.Rates", ObjectType::TableContents);
    index.apply_changes(&ChangeBatch::new().removed(rates.clone()));

    assert!(index.find_local_table_usages(base.id(), "Rates").unwrap().is_empty());
    assert!(index.find_table_usages(mid.id(), "Rates").unwrap().is_empty());
    assert_eq!(
        index.find_table_usages(top.id(), "Rates").unwrap(),
        vec![local.handle()]
    );
}

#[test]
fn test_changed_structure_moves_downstream() {
    let index = model_index();
    let base = project(&index, "base", &[]);
    let top = project(&index, "top", &[("base", true)]);
    let rates = table_contents(&base, "tables.Rates", "Old");
    assert_eq!(index.find_table_usages(top.id(), "Old").unwrap().len(), 1);

    rates.set_property("tableStructure", "New");
    index.apply_changes(&ChangeBatch::new().changed(rates.clone()));

    assert!(index.find_table_usages(top.id(), "Old").unwrap().is_empty());
    assert_eq!(
        index.find_table_usages(top.id(), "New").unwrap(),
        vec![rates.handle()]
    );
}

#[test]
fn test_reexport_flag_flip_after_population() {
    let index = model_index();
    let a = project(&index, "a", &[]);
    let c = project(&index, "c", &[("a", false)]);
    let top = project(&index, "top", &[("c", true)]);
    let rates = table_contents(&a, "tables.Rates", "Rates");
    assert!(index.find_table_usages(c.id(), "Rates").unwrap().is_empty());
    assert!(index.find_table_usages(top.id(), "Rates").unwrap().is_empty());

    c.set_dependencies(vec![DependencyEdge::new("a", true)]);
    let stats = index.apply_changes(&ChangeBatch::new().dependencies_changed(c.id()));

    assert_eq!(stats.invalidated, 2);
    assert_eq!(
        index.find_table_usages(c.id(), "Rates").unwrap(),
        vec![rates.handle()]
    );
    assert_eq!(
        index.find_table_usages(top.id(), "Rates").unwrap(),
        vec![rates.handle()]
    );

    c.set_dependencies(vec![DependencyEdge::new("a", false)]);
    index.apply_changes(&ChangeBatch::new().dependencies_changed(c.id()));

    assert!(index.find_table_usages(c.id(), "Rates").unwrap().is_empty());
    assert!(index.find_table_usages(top.id(), "Rates").unwrap().is_empty());
    // Local caches survive graph changes
    assert_eq!(index.stats().table_usage.build_count, 3);
}

#[test]
fn test_unchanged_edges_keep_aggregates() {
    let index = model_index();
    let a = project(&index, "a", &[]);
    let c = project(&index, "c", &[("a", true)]);
    table_contents(&a, "tables.Rates", "Rates");
    index.find_table_usages(c.id(), "Rates").unwrap();

    let stats = index.apply_changes(&ChangeBatch::new().dependencies_changed(c.id()));

    assert_eq!(stats.invalidated, 0);
    assert_eq!(index.stats().table_usage_aggregates.built, 1);
}

#[test]
fn test_cyclic_dependencies_terminate() {
    let index = model_index();
    let a = project(&index, "a", &[("b", true)]);
    let b = project(&index, "b", &[("c", true)]);
    let c = project(&index, "c", &[("a", true)]);
    let in_a = table_contents(&a, "tables.A", "Rates");
    let in_b = table_contents(&b, "tables.B", "Rates");
    let in_c = table_contents(&c, "tables.C", "Rates");

    for p in [&a, &b, &c] {
        assert_eq!(
            index.find_table_usages(p.id(), "Rates").unwrap(),
            vec![in_a.handle(), in_b.handle(), in_c.handle()]
        );
    }

    let extra = table_contents(&b, "tables.B2", "Rates");
    index.apply_changes(&ChangeBatch::new().added(extra));
    for p in [&a, &b, &c] {
        assert_eq!(index.find_table_usages(p.id(), "Rates").unwrap().len(), 4);
    }
}

#[test]
fn test_missing_dependency_contributes_nothing() {
    let index = model_index();
    let top = project(&index, "top", &[("absent", true)]);
    let local = table_contents(&top, "tables.Rates", "Rates");

    assert_eq!(
        index.find_table_usages(top.id(), "Rates").unwrap(),
        vec![local.handle()]
    );

    // Registering the missing project later makes it visible
    let absent = project(&index, "absent", &[]);
    let remote = table_contents(&absent, "tables.Remote", "Rates");
    assert_eq!(
        index.find_table_usages(top.id(), "Rates").unwrap(),
        vec![local.handle(), remote.handle()]
    );
}

#[test]
fn test_failed_member_build_fails_query_and_recovers() {
    let index = model_index();
    let base = project(&index, "base", &[]);
    let top = project(&index, "top", &[("base", true)]);
    let rates = table_contents(&base, "tables.Rates", "Rates");
    base.set_fail_enumeration(true);

    assert!(index.find_table_usages(top.id(), "Rates").is_err());
    assert_eq!(index.stats().table_usage_aggregates.built, 0);

    base.set_fail_enumeration(false);
    assert_eq!(
        index.find_table_usages(top.id(), "Rates").unwrap(),
        vec![rates.handle()]
    );
}
