/// End-to-end tests for the taxtable workflow
///
/// These tests verify:
/// - Ingesting new-node CSV records into a database on disk
/// - add_source / add_node semantics, including duplicate absorption
/// - Table export column selection (sparse vs. full) over a session
use std::collections::HashSet;
use std::io::Write;

use pretty_assertions::assert_eq;
use taxtree::store::{NameRow, NodeRow, TaxStore};
use taxtree::{ingest, NewNode, Taxonomy, TaxtreeError};

fn seeded_db(path: &std::path::Path) {
    let store = TaxStore::open(path).unwrap();
    store.init_schema().unwrap();
    let nodes = [
        ("1", "1", "root"),
        ("2", "1", "superkingdom"),
        ("1279", "2", "genus"),
    ];
    for (tax_id, parent_id, rank) in nodes {
        store
            .insert_node(&NodeRow {
                tax_id: tax_id.to_string(),
                parent_id: parent_id.to_string(),
                rank: rank.to_string(),
                source_id: 1,
            })
            .unwrap();
    }
    let names = [
        ("1", "root"),
        ("2", "Bacteria"),
        ("1279", "Staphylococcus"),
    ];
    for (tax_id, name) in names {
        store
            .insert_name(&NameRow {
                tax_id: tax_id.to_string(),
                tax_name: name.to_string(),
                is_primary: true,
            })
            .unwrap();
    }
}

#[test]
fn ingested_nodes_flow_through_add_node_into_lineages() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("taxonomy.db");
    seeded_db(&db);

    let csv_path = dir.path().join("new_nodes.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "tax_id,parent_id,rank,tax_name,source_name").unwrap();
    writeln!(file, "1280,1279,species,Staphylococcus aureus,bergeys").unwrap();
    writeln!(file, "1281,1279,species,Staphylococcus carnosus,bergeys").unwrap();
    drop(file);

    let mut tax = Taxonomy::new(TaxStore::open(&db).unwrap());
    for node in ingest::read_new_nodes(&csv_path).unwrap() {
        tax.add_node(&node).unwrap();
    }

    assert!(tax.has_lineage("1280"));
    assert!(tax.has_lineage("1281"));
    let lineage = tax.lineage("1280").unwrap();
    assert_eq!(lineage.ancestor_at("genus"), Some("1279"));
    assert_eq!(lineage.tax_name, "Staphylococcus aureus");

    // Both records named the same source; one row was created.
    let (id, created) = tax.add_source("bergeys", None).unwrap();
    assert!(!created);
    assert_eq!(tax.store().source_id_by_name("bergeys").unwrap(), Some(id));
}

#[test]
fn re_adding_an_existing_tax_id_is_a_database_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("taxonomy.db");
    seeded_db(&db);

    let mut tax = Taxonomy::new(TaxStore::open(&db).unwrap());
    let node = NewNode {
        tax_id: "1279".to_string(),
        parent_id: "2".to_string(),
        rank: "genus".to_string(),
        tax_name: "Staphylococcus".to_string(),
        source_id: Some(1),
        source_name: None,
    };

    // Bulk callers log and skip this; the engine itself must surface it.
    assert!(matches!(
        tax.add_node(&node),
        Err(TaxtreeError::Database(_))
    ));
}

#[test]
fn exported_table_reflects_the_whole_session() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("taxonomy.db");
    seeded_db(&db);

    let mut tax = Taxonomy::new(TaxStore::open(&db).unwrap());
    tax.lineage("1279").unwrap();
    tax.add_node(&NewNode {
        tax_id: "1280".to_string(),
        parent_id: "1279".to_string(),
        rank: "species".to_string(),
        tax_name: "Staphylococcus aureus".to_string(),
        source_id: None,
        source_name: Some("bergeys".to_string()),
    })
    .unwrap();

    let mut buf = Vec::new();
    tax.write_table(None, false, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();

    let header = lines.next().unwrap();
    assert_eq!(
        header,
        "\"tax_id\",\"parent_id\",\"rank\",\"tax_name\",\"root\",\"superkingdom\",\"genus\",\"species\""
    );
    // Genus row first (lower tax_id), species column empty for it.
    assert_eq!(
        lines.next().unwrap(),
        "1279,2,\"genus\",\"Staphylococcus\",1,2,1279,\"\""
    );
    assert_eq!(
        lines.next().unwrap(),
        "1280,1279,\"species\",\"Staphylococcus aureus\",1,2,1279,1280"
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn sparse_export_of_a_subset_drops_unoccupied_rank_columns() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("taxonomy.db");
    seeded_db(&db);

    let mut tax = Taxonomy::new(TaxStore::open(&db).unwrap());
    tax.lineage("2").unwrap();
    tax.lineage("1279").unwrap();

    let subset: HashSet<String> = ["2".to_string()].into();
    let mut buf = Vec::new();
    tax.write_table(Some(&subset), false, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let header = text.lines().next().unwrap();
    assert!(header.contains("\"superkingdom\""));
    assert!(!header.contains("\"genus\""));
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn full_export_emits_all_registered_ranks_regardless_of_occupancy() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("taxonomy.db");
    seeded_db(&db);

    let mut tax = Taxonomy::new(TaxStore::open(&db).unwrap());
    tax.lineage("2").unwrap();

    let mut buf = Vec::new();
    tax.write_table(None, true, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let header = text.lines().next().unwrap();
    for rank in ["\"forma\"", "\"varietas\"", "\"species_group\""] {
        assert!(header.contains(rank), "missing {rank} in {header}");
    }
}
