use bomforest::application::{Registry, Request};
use bomforest::cli::{Command, CommandParser};
use bomforest::domain::{Item, RuleViolation};
use bomforest::util::testing;
use rstest::{fixture, rstest};

#[fixture]
fn registry() -> Registry {
    testing::init_test_setup();
    Registry::new()
}

/// Runs one shell line against the registry.
fn run(registry: &mut Registry, line: &str) -> Result<String, String> {
    let parser = CommandParser::new("quit").unwrap();
    match parser.parse(line).unwrap() {
        Command::Execute(request) => registry.execute(request).map_err(|e| e.to_string()),
        Command::Quit => panic!("unexpected quit: {line}"),
    }
}

fn run_all(registry: &mut Registry, lines: &[&str]) {
    for line in lines {
        run(registry, line).unwrap_or_else(|e| panic!("{line}: {e}"));
    }
    registry.check_consistency().unwrap();
}

#[rstest]
fn given_fresh_forest_when_running_scenario_then_outputs_match(mut registry: Registry) {
    assert_eq!(run(&mut registry, "addAssembly A=2:B;3:C"), Ok("OK".into()));
    assert_eq!(run(&mut registry, "printAssembly A"), Ok("B:2;C:3".into()));
    assert_eq!(run(&mut registry, "getComponents A"), Ok("C:3;B:2".into()));
    assert_eq!(run(&mut registry, "removePart A-2:B"), Ok("OK".into()));
    assert_eq!(run(&mut registry, "printAssembly A"), Ok("C:3".into()));
    registry.check_consistency().unwrap();
}

#[rstest]
fn given_nested_assembly_when_getting_components_then_quantities_multiply(
    mut registry: Registry,
) {
    run_all(&mut registry, &["addAssembly A=2:B", "addAssembly B=3:C"]);

    assert_eq!(run(&mut registry, "getComponents A"), Ok("C:6".into()));
    assert_eq!(run(&mut registry, "getAssemblies A"), Ok("B:2".into()));
    assert_eq!(run(&mut registry, "getComponents B"), Ok("C:3".into()));
    assert_eq!(registry.tree_names(), vec!["A"]);
}

#[rstest]
fn given_self_reference_when_adding_assembly_then_cycle_a_a(mut registry: Registry) {
    assert_eq!(
        run(&mut registry, "addAssembly A=1:A"),
        Err("this addition would cause a cycle: A-A".into())
    );
    assert!(registry.tree_names().is_empty());
}

#[rstest]
fn given_chain_when_closing_loop_then_cycle_path_is_reported(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=1:B", "addAssembly B=1:C"]);

    assert_eq!(
        run(&mut registry, "addAssembly C=1:A"),
        Err("this addition would cause a cycle: A-B-C-A".into())
    );
    run_all(&mut registry, &["addAssembly C=1:D"]);
    assert_eq!(
        run(&mut registry, "addPart C+1:A"),
        Err("this addition would cause a cycle: A-B-C-A".into())
    );
    assert_eq!(
        run(&mut registry, "addAssembly D=1:A"),
        Err("this addition would cause a cycle: A-B-C-D-A".into())
    );
    assert_eq!(run(&mut registry, "getComponents A"), Ok("D:1".into()));
    assert_eq!(run(&mut registry, "printAssembly C"), Ok("D:1".into()));
    registry.check_consistency().unwrap();
}

#[rstest]
#[case("addAssembly A=1000:B", Ok("OK"))]
#[case("addAssembly A=1001:B", Err("the amount of a part/assembly cannot exceed 1000."))]
#[case("addAssembly A=0:B", Err("the amount of a part/assembly must be at least 1: B"))]
fn given_quantity_when_adding_assembly_then_bound_is_enforced(
    mut registry: Registry,
    #[case] line: &str,
    #[case] expected: Result<&str, &str>,
) {
    let expected = expected.map(String::from).map_err(String::from);
    assert_eq!(run(&mut registry, line), expected);
}

#[rstest]
fn given_existing_child_when_adding_part_then_sum_is_bounded(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=999:B"]);

    assert_eq!(run(&mut registry, "addPart A+1:B"), Ok("OK".into()));
    assert_eq!(
        run(&mut registry, "addPart A+1:B"),
        Err("the amount of a part/assembly cannot exceed 1000.".into())
    );
    assert_eq!(run(&mut registry, "printAssembly A"), Ok("B:1000".into()));
}

#[rstest]
fn given_lowered_ceiling_when_adding_then_ceiling_applies() {
    let mut registry = Registry::with_max_quantity(10);
    assert_eq!(registry.max_quantity(), 10);
    assert_eq!(
        run(&mut registry, "addAssembly A=11:B"),
        Err("the amount of a part/assembly cannot exceed 10.".into())
    );
    assert_eq!(Registry::with_max_quantity(5000).max_quantity(), 1000);
}

#[rstest]
fn given_assembly_when_removed_and_re_added_then_tree_is_reconstructed(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=2:B;3:C", "removeAssembly A"]);
    assert!(registry.tree_names().is_empty());
    assert!(!registry.is_part("B"));

    run_all(&mut registry, &["addAssembly A=2:B;3:C"]);
    assert_eq!(run(&mut registry, "printAssembly A"), Ok("B:2;C:3".into()));
}

#[rstest]
fn given_shared_assembly_when_one_copy_changes_then_other_copy_is_untouched(
    mut registry: Registry,
) {
    run_all(
        &mut registry,
        &[
            "addAssembly Sub=2:Bolt",
            "addAssembly Car=1:Sub",
            "addAssembly Bike=1:Sub",
        ],
    );
    assert_eq!(registry.tree_names(), vec!["Bike", "Car"]);

    run_all(&mut registry, &["addPart Car+3:Sub"]);
    assert_eq!(run(&mut registry, "printAssembly Car"), Ok("Sub:4".into()));
    assert_eq!(run(&mut registry, "printAssembly Bike"), Ok("Sub:1".into()));
    assert_eq!(run(&mut registry, "getComponents Car"), Ok("Bolt:8".into()));
    assert_eq!(run(&mut registry, "getComponents Bike"), Ok("Bolt:2".into()));

    let bolts = registry.occurrences("Bolt");
    assert_eq!(bolts.len(), 2);
    assert_ne!(bolts[0].tree, bolts[1].tree);
}

#[rstest]
fn given_assembly_definition_change_when_applied_then_every_occurrence_follows(
    mut registry: Registry,
) {
    run_all(
        &mut registry,
        &[
            "addAssembly Sub=2:Bolt",
            "addAssembly Car=4:Sub",
            "addAssembly Bike=1:Sub",
            "addPart Sub+1:Nut",
        ],
    );

    assert_eq!(run(&mut registry, "getComponents Car"), Ok("Bolt:8;Nut:4".into()));
    assert_eq!(run(&mut registry, "getComponents Bike"), Ok("Bolt:2;Nut:1".into()));
    assert_eq!(run(&mut registry, "printAssembly Sub"), Ok("Bolt:2;Nut:1".into()));
}

#[rstest]
fn given_part_in_two_trees_when_promoted_then_both_trees_roll_up(mut registry: Registry) {
    run_all(
        &mut registry,
        &["addAssembly A=1:X", "addAssembly B=2:X", "addAssembly X=5:Y"],
    );

    assert_eq!(run(&mut registry, "getComponents A"), Ok("Y:5".into()));
    assert_eq!(run(&mut registry, "getComponents B"), Ok("Y:10".into()));
    assert!(!registry.is_part("X"));
    assert!(registry.is_assembly("X"));
}

#[rstest]
fn given_standalone_tree_when_added_as_part_then_it_is_absorbed(mut registry: Registry) {
    run_all(
        &mut registry,
        &[
            "addAssembly Engine=4:Piston",
            "addAssembly Car=1:Frame",
            "addPart Car+1:Engine",
        ],
    );

    assert_eq!(registry.tree_names(), vec!["Car"]);
    assert_eq!(
        run(&mut registry, "getComponents Car"),
        Ok("Piston:4;Frame:1".into())
    );
    assert_eq!(
        run(&mut registry, "addAssembly Engine=1:Valve"),
        Err("an assembly of this name already exists".into())
    );
}

#[rstest]
fn given_last_child_when_removed_then_tree_is_deleted(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=2:B", "removePart A-2:B"]);

    assert!(registry.tree_names().is_empty());
    assert_eq!(
        run(&mut registry, "printAssembly A"),
        Err("no BOM or component exists in the system for the specified name: A.".into())
    );
}

#[rstest]
fn given_embedded_assembly_when_last_child_removed_then_it_becomes_a_part(
    mut registry: Registry,
) {
    run_all(
        &mut registry,
        &["addAssembly A=1:B;1:D", "addAssembly B=3:C", "removePart B-3:C"],
    );

    assert_eq!(run(&mut registry, "printAssembly B"), Ok("COMPONENT".into()));
    assert_eq!(run(&mut registry, "getAssemblies A"), Ok("EMPTY".into()));
    assert_eq!(run(&mut registry, "getComponents A"), Ok("B:1;D:1".into()));
}

#[rstest]
fn given_removal_errors_when_removing_part_then_messages_name_the_problem(
    mut registry: Registry,
) {
    run_all(&mut registry, &["addAssembly A=2:B"]);

    assert_eq!(
        run(&mut registry, "removePart A-1:X"),
        Err("A doesn't contain X.".into())
    );
    assert_eq!(
        run(&mut registry, "removePart A-3:B"),
        Err("A doesn't contain B in the specified amount: 3.".into())
    );
    assert_eq!(
        run(&mut registry, "removePart Z-1:B"),
        Err("no BOM exists in the system for the specified name: Z.".into())
    );
    assert_eq!(run(&mut registry, "removePart A-1:B"), Ok("OK".into()));
    assert_eq!(run(&mut registry, "printAssembly A"), Ok("B:1".into()));
}

#[rstest]
fn given_tree_with_sub_assembly_when_removing_tree_then_sub_assembly_survives(
    mut registry: Registry,
) {
    run_all(
        &mut registry,
        &["addAssembly Car=4:Wheel", "addAssembly Wheel=5:Bolt", "removeAssembly Car"],
    );

    assert_eq!(registry.tree_names(), vec!["Wheel"]);
    assert_eq!(run(&mut registry, "printAssembly Wheel"), Ok("Bolt:5".into()));
    assert_eq!(
        run(&mut registry, "getComponents Car"),
        Err("no BOM exists in the system for the specified name: Car.".into())
    );
}

#[rstest]
fn given_orphans_sharing_a_sub_assembly_when_removing_parent_then_each_name_keeps_one_role(
    mut registry: Registry,
) {
    run_all(
        &mut registry,
        &["addAssembly B=1:X", "addAssembly A=1:B", "addAssembly G=1:B;1:A"],
    );

    run_all(&mut registry, &["removeAssembly G"]);
    assert_eq!(registry.tree_names(), vec!["A"]);
    assert!(registry.tree("B").is_none());
    assert_eq!(registry.occurrences("B").len(), 1);

    run_all(&mut registry, &["addPart B+1:Y"]);
    assert_eq!(run(&mut registry, "printAssembly B"), Ok("X:1;Y:1".into()));
    assert_eq!(run(&mut registry, "getComponents A"), Ok("X:1;Y:1".into()));
}

#[rstest]
fn given_embedded_assembly_when_removed_then_occurrences_become_parts(mut registry: Registry) {
    run_all(
        &mut registry,
        &[
            "addAssembly Car=4:Wheel",
            "addAssembly Wheel=5:Bolt",
            "removeAssembly Wheel",
        ],
    );

    assert_eq!(run(&mut registry, "printAssembly Wheel"), Ok("COMPONENT".into()));
    assert!(!registry.is_part("Bolt"));
    assert_eq!(run(&mut registry, "getComponents Car"), Ok("Wheel:4".into()));
    assert_eq!(registry.tree_names(), vec!["Car"]);
}

#[rstest]
fn given_rejected_request_when_checking_forest_then_nothing_changed(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=1:B", "addAssembly B=1:C"]);

    assert!(run(&mut registry, "addAssembly C=1:D;2:A").is_err());
    assert!(run(&mut registry, "addAssembly X=1:Y;2:Y").is_err());

    assert!(!registry.is_assembly("X"));
    assert!(!registry.is_part("D"));
    assert_eq!(run(&mut registry, "getComponents A"), Ok("C:1".into()));
    registry.check_consistency().unwrap();
}

#[rstest]
fn given_part_name_when_adding_to_it_then_no_such_assembly(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=1:B"]);

    let err = registry
        .add_part("B", &Item::new("C", 1))
        .unwrap_err();
    assert_eq!(err, RuleViolation::NoSuchAssembly("B".into()));
}

#[rstest]
fn given_existing_assembly_when_adding_again_then_already_exists(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=1:B", "addAssembly B=1:C"]);

    for name in ["A", "B"] {
        let err = registry
            .run(Request::AddAssembly {
                name: name.into(),
                children: vec![Item::new("Z", 1)],
            })
            .unwrap_err();
        assert_eq!(err, RuleViolation::AssemblyExists(name.into()));
    }
}

#[rstest]
fn given_assembly_when_showing_tree_then_renders_structure(mut registry: Registry) {
    run_all(&mut registry, &["addAssembly A=2:B;3:C", "addAssembly B=4:D"]);

    let rendered = run(&mut registry, "showTree A").unwrap();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "A");
    assert!(lines[1].ends_with("B:2"));
    assert!(lines[2].ends_with("D:4"));
    assert!(lines[3].ends_with("C:3"));

    assert_eq!(run(&mut registry, "showTree C"), Ok("C".into()));
    assert!(run(&mut registry, "showTree Q").is_err());
}

#[rstest]
fn given_long_edit_sequence_when_checking_then_forest_stays_consistent(mut registry: Registry) {
    let lines = [
        "addAssembly Car=4:Wheel;1:Body;1:Engine",
        "addAssembly Wheel=1:Rim;1:Tire;5:Bolt",
        "addAssembly Engine=6:Piston;1:Block",
        "addAssembly Truck=6:Wheel;1:Engine",
        "addPart Engine+2:Bolt",
        "addAssembly Piston=1:Ring;1:Pin",
        "removePart Wheel-1:Tire",
        "addPart Truck+1:Trailer",
        "addAssembly Trailer=4:Wheel",
        "removeAssembly Engine",
        "addPart Wheel+1:Tire",
    ];
    for line in lines {
        run(&mut registry, line).unwrap_or_else(|e| panic!("{line}: {e}"));
        registry.check_consistency().unwrap_or_else(|e| panic!("after {line}: {e}"));
    }

    // Piston lost its last occurrence with Engine and lives on as its own tree
    assert_eq!(registry.tree_names(), vec!["Car", "Piston", "Truck"]);
    assert_eq!(
        run(&mut registry, "getComponents Truck"),
        Ok("Bolt:50;Rim:10;Tire:10;Engine:1".into())
    );
    assert!(run(&mut registry, "addPart Wheel+1:Truck").is_err());
}
