use aggregraph_core::schema::{AggregateDecl, MemberDecl, SchemaDocument, VariationCaseDecl};
use aggregraph_core::{
    compile, compile_best_effort, AggregateGraph, AggregateId, ResolveOptions, SchemaErrorKind,
    ValueType,
};

fn graph_of(doc: &SchemaDocument) -> AggregateGraph {
    compile(doc, &ResolveOptions::default())
        .expect("schema should compile")
        .into_graph()
}

fn id(graph: &AggregateGraph, path: &str) -> AggregateId {
    graph.find_by_path(path).expect(path)
}

fn order_schema() -> SchemaDocument {
    SchemaDocument::new(
        "Shop",
        vec![AggregateDecl::new(
            "Order",
            vec![
                MemberDecl::scalar("OrderId", "word").key(),
                MemberDecl::children(
                    "OrderLine",
                    vec![
                        MemberDecl::scalar("Qty", "integer"),
                        MemberDecl::child("Discount", vec![MemberDecl::scalar("Rate", "decimal")]),
                    ],
                ),
            ],
        )],
    )
}

#[test]
fn order_line_gets_a_surrogate_and_discount_inherits_it() {
    let graph = graph_of(&order_schema());
    let order = id(&graph, "Order");
    let line = id(&graph, "Order/OrderLine");
    let discount = id(&graph, "Order/OrderLine/Discount");

    let line_key = graph.primary_key(line);
    assert_eq!(line_key.len(), 2);
    assert_eq!(line_key[0], graph.primary_key(order)[0]);
    assert!(line_key[1].surrogate);
    assert_eq!(line_key[1].declaring, line);
    assert_eq!(line_key[1].value_type, ValueType::OpaqueId);

    // Child with no own keys: parent key verbatim.
    assert_eq!(graph.primary_key(discount), line_key);

    assert_eq!(graph.key_column_names(line), vec!["Order_OrderId", "__surrogate_id"]);
    assert_eq!(
        graph.key_column_names(discount),
        vec!["Order_OrderId", "OrderLine___surrogate_id"]
    );
}

#[test]
fn child_with_own_keys_appends_them() {
    let doc = SchemaDocument::new(
        "Shop",
        vec![AggregateDecl::new(
            "Order",
            vec![
                MemberDecl::scalar("OrderId", "word").key(),
                MemberDecl::child(
                    "Shipping",
                    vec![MemberDecl::scalar("Seq", "integer").key(), MemberDecl::scalar("Carrier", "word")],
                ),
            ],
        )],
    );
    let graph = graph_of(&doc);
    let shipping = id(&graph, "Order/Shipping");
    let names: Vec<&str> = graph
        .primary_key(shipping)
        .iter()
        .map(|k| k.member.as_str())
        .collect();
    assert_eq!(names, vec!["OrderId", "Seq"]);
}

#[test]
fn variation_cases_share_the_owner_key_and_ignore_their_own_flags() {
    let doc = SchemaDocument::new(
        "Shop",
        vec![AggregateDecl::new(
            "Payment",
            vec![
                MemberDecl::scalar("PaymentId", "word").key(),
                MemberDecl::variation(
                    "Method",
                    vec![
                        VariationCaseDecl::new("Cash", 1, vec![MemberDecl::scalar("Amount", "decimal")]),
                        VariationCaseDecl::new("Card", 2, vec![MemberDecl::scalar("CardNo", "word").key()]),
                    ],
                ),
            ],
        )],
    );
    let graph = graph_of(&doc);
    let payment = id(&graph, "Payment");
    for case in ["Payment/Cash", "Payment/Card"] {
        assert_eq!(graph.primary_key(id(&graph, case)), graph.primary_key(payment));
    }

    let method = graph.enums().get("E_Method").expect("variation enum");
    let items: Vec<(&str, i32)> = method.items.iter().map(|i| (i.name.as_str(), i.value)).collect();
    assert_eq!(items, vec![("Cash", 1), ("Card", 2)]);
}

#[test]
fn surrogates_are_unique_per_collection() {
    let doc = SchemaDocument::new(
        "Shop",
        vec![AggregateDecl::new(
            "Order",
            vec![
                MemberDecl::scalar("OrderId", "word").key(),
                MemberDecl::children("Lines", vec![MemberDecl::scalar("Qty", "integer")]),
                MemberDecl::children("Notes", vec![MemberDecl::scalar("Text", "sentence")]),
            ],
        )],
    );
    let graph = graph_of(&doc);
    let lines = graph.primary_key(id(&graph, "Order/Lines")).last().cloned().expect("key");
    let notes = graph.primary_key(id(&graph, "Order/Notes")).last().cloned().expect("key");
    assert!(lines.surrogate && notes.surrogate);
    assert_ne!(lines, notes);
}

#[test]
fn surrogate_name_follows_options() {
    let options = ResolveOptions {
        surrogate_key_name: "RowId".into(),
        ..ResolveOptions::default()
    };
    let graph = compile(&order_schema(), &options).expect("compile").into_graph();
    let line = id(&graph, "Order/OrderLine");
    assert_eq!(graph.primary_key(line)[1].member, "RowId");
}

#[test]
fn three_keyless_roots_yield_three_errors() {
    let doc = SchemaDocument::new(
        "Shop",
        vec![
            AggregateDecl::new(
                "A",
                vec![
                    MemberDecl::scalar("Name", "word"),
                    MemberDecl::children("Items", vec![MemberDecl::scalar("X", "word")]),
                ],
            ),
            AggregateDecl::new("B", vec![MemberDecl::scalar("Name", "word")]),
            AggregateDecl::new("C", vec![MemberDecl::child("Inner", vec![])]),
            AggregateDecl::new("D", vec![MemberDecl::scalar("Id", "word").key()]),
        ],
    );
    let compilation = compile_best_effort(&doc, &ResolveOptions::default());
    assert_eq!(compilation.errors.len(), 3);
    assert_eq!(compilation.errors.count(SchemaErrorKind::MissingKey), 3);

    let graph = compilation.graph.expect("graph");
    assert!(!graph.aggregate(id(&graph, "A/Items")).has_primary_key());
    assert!(graph.aggregate(id(&graph, "D")).has_primary_key());
}

#[test]
fn key_refs_import_the_target_key_in_declaration_position() {
    let doc = SchemaDocument::new(
        "Sales",
        vec![
            AggregateDecl::new(
                "Contract",
                vec![
                    MemberDecl::reference("customer", "Customer").key(),
                    MemberDecl::scalar("Seq", "integer").key(),
                ],
            ),
            AggregateDecl::new(
                "Customer",
                vec![
                    MemberDecl::scalar("Region", "word").key(),
                    MemberDecl::scalar("CustomerNo", "integer").key(),
                ],
            ),
        ],
    );
    let graph = graph_of(&doc);
    let contract = id(&graph, "Contract");
    let customer = id(&graph, "Customer");

    let key = graph.primary_key(contract);
    assert_eq!(key.len(), 3);
    assert_eq!(key[0].declaring, customer);
    assert_eq!(key[0].via_refs.len(), 1);
    assert_eq!(key[0].via_refs[0].member, "customer");
    assert_eq!(
        graph.key_column_names(contract),
        vec!["customer_Region", "customer_CustomerNo", "Seq"]
    );
}

#[test]
fn mutual_key_refs_are_one_cycle_error() {
    let doc = SchemaDocument::new(
        "Loop",
        vec![
            AggregateDecl::new("A", vec![MemberDecl::reference("b", "B").key()]),
            AggregateDecl::new("B", vec![MemberDecl::reference("a", "A").key()]),
        ],
    );
    let compilation = compile_best_effort(&doc, &ResolveOptions::default());
    assert_eq!(compilation.errors.len(), 1);
    let err = &compilation.errors.as_slice()[0];
    assert_eq!(err.kind, SchemaErrorKind::Structural);
    assert!(err.message.contains("A -> B -> A"), "{}", err.message);
    // Closed by B's key-ref back to A.
    assert_eq!(err.location.to_string(), "B.a");

    let graph = compilation.graph.expect("graph");
    assert!(graph.aggregates().iter().all(|a| !a.has_primary_key()));
    assert!(graph.navigation().is_empty());
}

#[test]
fn key_ref_into_own_subtree_is_a_cycle() {
    let doc = SchemaDocument::new(
        "Loop",
        vec![AggregateDecl::new(
            "Order",
            vec![
                MemberDecl::reference("first", "Order/Lines").key(),
                MemberDecl::children("Lines", vec![MemberDecl::scalar("No", "integer").key()]),
            ],
        )],
    );
    let compilation = compile_best_effort(&doc, &ResolveOptions::default());
    assert_eq!(compilation.errors.count(SchemaErrorKind::Structural), 1);
    assert_eq!(compilation.errors.len(), 1);
    // Closed by the nested aggregate's ownership edge back to its owner.
    let err = &compilation.errors.as_slice()[0];
    assert_eq!(err.location.to_string(), "Order/Lines");
    assert!(err.message.contains("Order -> Order/Lines -> Order"), "{}", err.message);
}

#[test]
fn key_ref_to_a_keyless_target_adds_no_second_error() {
    let doc = SchemaDocument::new(
        "Sales",
        vec![
            AggregateDecl::new("Contract", vec![MemberDecl::reference("customer", "Customer").key()]),
            AggregateDecl::new("Customer", vec![MemberDecl::scalar("Name", "word")]),
        ],
    );
    let compilation = compile_best_effort(&doc, &ResolveOptions::default());
    assert_eq!(compilation.errors.len(), 1);
    assert_eq!(compilation.errors.count(SchemaErrorKind::MissingKey), 1);
    assert!(compilation.errors.as_slice()[0].location.to_string().starts_with("Customer"));
}
