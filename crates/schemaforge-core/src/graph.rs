use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::Id;
use crate::schema::Schema;

/// Summary of the identifying-relationship graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyingGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Provider-before-dependent ordering of a schema's tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyingGraphReport {
    pub summary: IdentifyingGraphSummary,
    /// Table names, key providers first; `None` when the graph is cyclic.
    pub order: Option<Vec<String>>,
    /// Table names left on a cycle; `None` when the graph is acyclic.
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic report over the IDENTIFYING edges of `schema`.
pub fn identifying_order(schema: &Schema) -> IdentifyingGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = IdentifyingGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => IdentifyingGraphReport {
            summary,
            order: Some(order),
            cycle: None,
        },
        Err(cycle) => IdentifyingGraphReport {
            summary,
            order: None,
            cycle: Some(cycle),
        },
    }
}

/// Reject an IDENTIFYING edge `fk_table -> pk_table` that would close a cycle.
///
/// The walk starts at the referenced table and follows IDENTIFYING edges
/// toward key providers; reaching the foreign-key holder means the new edge
/// closes a loop. A self-reference is always a cycle. `ignore` excludes one
/// existing relationship, e.g. the one being re-validated.
pub fn ensure_identifying_acyclic(
    schema: &Schema,
    fk_table_id: &Id,
    pk_table_id: &Id,
    ignore: Option<&Id>,
) -> Result<()> {
    if !reaches_provider(schema, pk_table_id, fk_table_id, ignore) {
        return Ok(());
    }

    let name_of = |table_id: &Id| {
        schema
            .table(table_id)
            .map(|table| table.name.clone())
            .unwrap_or_else(|| table_id.to_string())
    };
    Err(Error::RelationshipCyclicReference {
        fk_table: name_of(fk_table_id),
        pk_table: name_of(pk_table_id),
    })
}

/// Whether `goal` is reachable from `start` through IDENTIFYING edges
/// walked in holder-to-provider direction.
fn reaches_provider(schema: &Schema, start: &Id, goal: &Id, ignore: Option<&Id>) -> bool {
    let mut stack = vec![start.clone()];
    let mut visited: HashSet<Id> = HashSet::new();

    while let Some(current) = stack.pop() {
        if &current == goal {
            return true;
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        let Some(table) = schema.table(&current) else {
            continue;
        };
        for relationship in &table.relationships {
            if !relationship.is_identifying() || Some(&relationship.id) == ignore {
                continue;
            }
            if !visited.contains(&relationship.pk_table_id) {
                stack.push(relationship.pk_table_id.clone());
            }
        }
    }

    false
}

/// Provider name -> dependent names, restricted to IDENTIFYING edges.
fn build_adjacency(schema: &Schema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in &schema.tables {
        graph.entry(table.name.clone()).or_default();

        for relationship in table
            .relationships
            .iter()
            .filter(|relationship| relationship.is_identifying())
        {
            if let Some(provider) = schema.table(&relationship.pk_table_id) {
                graph
                    .entry(provider.name.clone())
                    .or_default()
                    .insert(table.name.clone());
            }
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then(|| node.clone()))
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{ColumnBuilder, RelationshipBuilder, SchemaBuilder, TableBuilder};
    use crate::constraints::RelationshipKind;

    fn chain_schema() -> Schema {
        SchemaBuilder::new("app")
            .table(
                TableBuilder::new("users")
                    .column(ColumnBuilder::new("id").data_type("INT"))
                    .primary_key(["id"]),
            )
            .table(
                TableBuilder::new("orders")
                    .column(ColumnBuilder::new("id").data_type("INT"))
                    .column(ColumnBuilder::new("users_id").data_type("INT"))
                    .primary_key(["id", "users_id"])
                    .relationship(
                        RelationshipBuilder::new("fk_orders_users", "users", RelationshipKind::Identifying)
                            .map("users_id", "id"),
                    ),
            )
            .build_schema()
    }

    #[test]
    fn orders_providers_first() {
        let schema = chain_schema();
        let report = identifying_order(&schema);
        let order = report.order.expect("expected toposort");
        let users = order.iter().position(|name| name == "users").unwrap();
        let orders = order.iter().position(|name| name == "orders").unwrap();
        assert!(users < orders);
        assert_eq!(report.summary.edges, 1);
    }

    #[test]
    fn rejects_back_edge_and_self_reference() {
        let schema = chain_schema();
        let users = schema.table_by_name("users").unwrap().id.clone();
        let orders = schema.table_by_name("orders").unwrap().id.clone();

        let err = ensure_identifying_acyclic(&schema, &users, &orders, None).unwrap_err();
        assert_eq!(
            err,
            Error::RelationshipCyclicReference {
                fk_table: "users".to_string(),
                pk_table: "orders".to_string(),
            }
        );

        assert!(ensure_identifying_acyclic(&schema, &users, &users, None).is_err());
        assert!(ensure_identifying_acyclic(&schema, &orders, &users, None).is_ok());
    }

    #[test]
    fn ignored_relationship_does_not_count() {
        let schema = chain_schema();
        let users = schema.table_by_name("users").unwrap().id.clone();
        let orders_table = schema.table_by_name("orders").unwrap();
        let existing = orders_table.relationships[0].id.clone();

        assert!(
            ensure_identifying_acyclic(&schema, &users, &orders_table.id, Some(&existing)).is_ok()
        );
    }
}
