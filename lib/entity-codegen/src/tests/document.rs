use std::error::Error;

use crate::{
    document::{
        document_name, DocumentError, DocumentSynthesizer, SynthesisOptions, DEFAULT_MAX_DEPTH,
    },
    schema::{parse_schema, OperationKind, TypeNode},
    selection::FieldSelection,
    tests::testkit::{build_root, fixture_schema, init_logger, read_dashboards_selection},
};

#[test]
fn read_dashboards_document() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = fixture_schema();
    let root = build_root(&schema, OperationKind::Query, read_dashboards_selection());

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "dashboards",
        "read",
        OperationKind::Query,
        &root,
    )?;

    assert_eq!(document.name, "ReadDashboards");
    assert!(document
        .to_string()
        .starts_with("query ReadDashboards($guid: EntityGuid!, $cursor: Cursor) { actor { entity(guid: $guid) { "));
    insta::assert_snapshot!(document.pretty(), @r#"
    query ReadDashboards($guid: EntityGuid!, $cursor: Cursor) {
      actor {
        entity(guid: $guid) {
          guid
          name
          type
          tags {
            key
            values
          }
          relatedEntities(cursor: $cursor) {
            nextCursor
          }
          ... on DashboardEntity {
            guid
            name
            type
            tags {
              key
              values
            }
            relatedEntities(cursor: $cursor) {
              nextCursor
            }
            createdAt
            permissions
            pages {
              guid
              name
              widgets {
                id
                title
                visualization {
                  id
                }
              }
            }
            owner {
              email
              userId
            }
          }
        }
      }
    }
    "#);
    Ok(())
}

#[test]
fn header_body_and_trailer() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = fixture_schema();
    let selection = FieldSelection::new("dashboardCreate", "DashboardCreateResult")
        .pruned()
        .with_sub_field(FieldSelection::new("entityResult", "DashboardEntityResult"));
    let root = build_root(&schema, OperationKind::Mutation, selection);

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "dashboards",
        "create",
        OperationKind::Mutation,
        &root,
    )?;

    assert_eq!(
        document.header(),
        "mutation CreateDashboards($accountId: Int!, $dashboard: DashboardInput!) {"
    );
    assert_eq!(
        document.body(),
        "dashboardCreate(accountId: $accountId, dashboard: $dashboard) { entityResult { guid name accountId } }"
    );
    assert_eq!(document.trailer(), "}");
    insta::assert_snapshot!(document, @"mutation CreateDashboards($accountId: Int!, $dashboard: DashboardInput!) { dashboardCreate(accountId: $accountId, dashboard: $dashboard) { entityResult { guid name accountId } } }");
    Ok(())
}

#[test]
fn union_members_without_fields_are_omitted() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = fixture_schema();
    let root = build_root(
        &schema,
        OperationKind::Mutation,
        FieldSelection::new("dashboardDelete", "DashboardDeleteResult"),
    );

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "dashboards",
        "delete",
        OperationKind::Mutation,
        &root,
    )?;

    insta::assert_snapshot!(document, @"mutation DeleteDashboards($guid: EntityGuid!) { dashboardDelete(guid: $guid) { status outcome { ... on DashboardDeleteSuccess { deletedAt } } } }");
    assert!(!document.to_string().contains("DashboardDeleteNoop"));
    Ok(())
}

#[test]
fn alias_renders_before_the_field_name() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = fixture_schema();
    let selection = FieldSelection::new("actor", "Actor").pruned().with_sub_field(
        FieldSelection::new("entity", "Entity")
            .pruned()
            .with_alias("dashboard")
            .with_sub_field(FieldSelection::new("tags", "Tag")),
    );
    let root = build_root(&schema, OperationKind::Query, selection);

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "dashboards",
        "read",
        OperationKind::Query,
        &root,
    )?;

    insta::assert_snapshot!(document, @"query ReadDashboards($guid: EntityGuid!) { actor { dashboard: entity(guid: $guid) { tags { key values } } } }");
    Ok(())
}

#[test]
fn recurring_arguments_are_declared_once() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = parse_schema(
        r#"
        scalar EntityGuid
        type Query { actor: Actor }
        type Actor { entity(guid: EntityGuid!): Entity }
        type Entity { name: String linked(guid: EntityGuid!): Linked }
        type Linked { name: String deeper(guid: EntityGuid!, limit: Int): Linked2 }
        type Linked2 { name: String }
        "#,
    )?;
    let root = build_root(
        &schema,
        OperationKind::Query,
        FieldSelection::new("actor", "Actor")
            .pruned()
            .with_sub_field(FieldSelection::new("entity", "Entity")),
    );

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "entities",
        "read",
        OperationKind::Query,
        &root,
    )?;

    insta::assert_snapshot!(document, @"query ReadEntities($guid: EntityGuid!, $limit: Int) { actor { entity(guid: $guid) { name linked(guid: $guid) { name deeper(guid: $guid, limit: $limit) { name } } } } }");
    assert_eq!(document.to_string().matches("$guid:").count(), 1);
    Ok(())
}

#[test]
fn conflicting_variable_types_are_rejected() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = parse_schema(
        r#"
        type Query { account(id: Int!): Account }
        type Account { name: String widget(id: ID!): Widget }
        type Widget { title: String }
        "#,
    )?;
    let root = build_root(
        &schema,
        OperationKind::Query,
        FieldSelection::new("account", "Account"),
    );

    let err = DocumentSynthesizer::new(&schema, SynthesisOptions::default())
        .synthesize("accounts", "read", OperationKind::Query, &root)
        .unwrap_err();

    assert_eq!(
        err,
        DocumentError::ConflictingVariable {
            name: "id".to_string(),
            existing: TypeNode::NonNull(Box::new(TypeNode::Named("Int".to_string()))),
            conflicting: TypeNode::NonNull(Box::new(TypeNode::Named("ID".to_string()))),
        }
    );
    Ok(())
}

#[test]
fn empty_built_selection_set_is_an_error() {
    init_logger();
    let schema = fixture_schema();
    let root = build_root(
        &schema,
        OperationKind::Query,
        FieldSelection::new("actor", "Actor")
            .pruned()
            .with_sub_field(FieldSelection::new("user", "User").pruned()),
    );

    let err = DocumentSynthesizer::new(&schema, SynthesisOptions::default())
        .synthesize("users", "read", OperationKind::Query, &root)
        .unwrap_err();

    assert_eq!(
        err,
        DocumentError::EmptySelectionSet {
            path: "actor.user".to_string()
        }
    );
}

#[test]
fn fields_without_selectable_content_drop_their_variables() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = parse_schema(
        r#"
        type Query { node: Node }
        type Node { id: ID children(first: Int): [Node] }
        "#,
    )?;
    let root = build_root(&schema, OperationKind::Query, FieldSelection::new("node", "Node"));

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "nodes",
        "read",
        OperationKind::Query,
        &root,
    )?;

    // `children` only leads back into `Node`, so it is left out along with `$first`.
    insta::assert_snapshot!(document, @"query ReadNodes { node { id } }");
    Ok(())
}

#[test]
fn arguments_of_dropped_fields_never_conflict() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = parse_schema(
        r#"
        type Query { node(id: Int!): Node }
        type Node { name: String children(id: ID): [Node] }
        "#,
    )?;
    let root = build_root(&schema, OperationKind::Query, FieldSelection::new("node", "Node"));

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "nodes",
        "read",
        OperationKind::Query,
        &root,
    )?;

    insta::assert_snapshot!(document, @"query ReadNodes($id: Int!) { node(id: $id) { name } }");
    Ok(())
}

#[test]
fn union_without_selectable_members_is_dropped_with_its_variables() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = parse_schema(
        r#"
        type Query { node(id: ID!): Node }
        type Node { name: String result(token: String): Outcome }
        union Outcome = Gone | Loop
        type Gone { reason: String @deprecated }
        type Loop { node: Node }
        "#,
    )?;
    let root = build_root(&schema, OperationKind::Query, FieldSelection::new("node", "Node"));

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default()).synthesize(
        "nodes",
        "read",
        OperationKind::Query,
        &root,
    )?;

    insta::assert_snapshot!(document, @"query ReadNodes($id: ID!) { node(id: $id) { name } }");
    assert!(!document.to_string().contains("... on"));
    Ok(())
}

#[test]
fn default_depth_bounds_fan_out_schemas() -> Result<(), Box<dyn Error>> {
    init_logger();
    let mut sdl = String::from("type Query { t0: T0 }\n");
    for level in 0..30 {
        sdl.push_str(&format!(
            "type T{level} {{ name: String a{level}: T{next} b{level}: T{next} }}\n",
            next = level + 1
        ));
    }
    sdl.push_str("type T30 { name: String }\n");
    let schema = parse_schema(&sdl)?;
    let root = build_root(&schema, OperationKind::Query, FieldSelection::new("t0", "T0"));

    let options = SynthesisOptions::default();
    assert_eq!(options.max_depth, Some(DEFAULT_MAX_DEPTH));
    let document = DocumentSynthesizer::new(&schema, options)
        .synthesize("levels", "read", OperationKind::Query, &root)?
        .to_string();

    assert!(document.contains("a8 { name }"));
    assert!(!document.contains("a9"));
    assert!(document.len() < 100_000);
    Ok(())
}

#[test]
fn max_depth_bounds_schema_expansion() -> Result<(), Box<dyn Error>> {
    init_logger();
    let schema = fixture_schema();
    let root = build_root(
        &schema,
        OperationKind::Query,
        FieldSelection::new("actor", "Actor").pruned().with_sub_field(
            FieldSelection::new("entity", "Entity").pruned().with_sub_field(
                FieldSelection::new("dashboard", "DashboardEntity")
                    .with_fragment("DashboardEntity"),
            ),
        ),
    );

    let document = DocumentSynthesizer::new(&schema, SynthesisOptions { max_depth: Some(3) })
        .synthesize("dashboards", "read", OperationKind::Query, &root)?;

    insta::assert_snapshot!(document, @"query ReadDashboards($guid: EntityGuid!) { actor { entity(guid: $guid) { ... on DashboardEntity { guid name type createdAt permissions } } } }");
    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> Result<(), Box<dyn Error>> {
    init_logger();
    let render = || -> Result<String, Box<dyn Error>> {
        let schema = fixture_schema();
        let root = build_root(&schema, OperationKind::Query, read_dashboards_selection());
        let document = DocumentSynthesizer::new(&schema, SynthesisOptions::default())
            .synthesize("dashboards", "read", OperationKind::Query, &root)?;
        Ok(document.pretty())
    };

    assert_eq!(render()?, render()?);
    Ok(())
}

#[test]
fn document_names_capitalize_both_parts() {
    assert_eq!(document_name("dashboards", "read"), "ReadDashboards");
    assert_eq!(document_name("dashboards", "addWidgets"), "AddWidgetsDashboards");
    assert_eq!(document_name("", "list"), "List");
}
