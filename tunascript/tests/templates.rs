use tunascript::expansion::{self, Block, Condition};
use tunascript::{Interpreter, MemoryWorld, TsError, Value};

fn interp() -> Interpreter<MemoryWorld> {
    Interpreter::new(MemoryWorld::new())
}

#[test]
fn if_else_picks_a_branch() {
    let mut ts = interp();
    let tmpl = "Hi $[[IF $X]]yes$[[ELSE]]no$[[ENDIF]]!";
    ts.set_flag("X", true);
    assert_eq!(ts.expand(tmpl).expect("expand ok"), "Hi yes!");
    ts.set_flag("X", false);
    assert_eq!(ts.expand(tmpl).expect("expand ok"), "Hi no!");
}

#[test]
fn first_true_condition_wins() {
    let mut ts = interp();
    let tmpl = "$[[IF $HP > 10]]healthy$[[ELSE IF $HP > 3]]hurt$[[ELIF $HP > 0]]dying$[[ELSE]]dead$[[ENDIF]]";
    for (hp, want) in [(20, "healthy"), (5, "hurt"), (1, "dying"), (0, "dead")] {
        ts.set_flag("HP", Value::Int(hp));
        assert_eq!(ts.expand(tmpl).expect("expand ok"), want, "HP = {hp}");
    }
}

#[test]
fn no_matching_branch_collapses_the_gap() {
    let mut ts = interp();
    let tmpl = "You see a door $[[IF $OPEN]]standing open$[[ENDIF]] to the north.";
    assert_eq!(ts.expand(tmpl).expect("expand ok"), "You see a door to the north.");
    ts.set_flag("OPEN", true);
    assert_eq!(ts.expand(tmpl).expect("expand ok"), "You see a door standing open to the north.");
}

#[test]
fn collapse_drops_one_space_and_keeps_line_breaks() {
    let mut ts = interp();
    let para = "First paragraph.\n\n$[[IF $X]]Extra.$[[ENDIF]]\nSecond.";
    assert_eq!(ts.expand(para).expect("expand ok"), "First paragraph.\n\n\nSecond.");

    let wide = "a   $[[IF $X]]b$[[ENDIF]]  c";
    assert_eq!(ts.expand(wide).expect("expand ok"), "a    c");

    let tabbed = "a\t$[[IF $X]]b$[[ENDIF]] c";
    assert_eq!(ts.expand(tabbed).expect("expand ok"), "a\t c");
}

#[test]
fn flags_expand_to_their_string_form() {
    let mut ts = interp();
    ts.set_flag("COINS", Value::Int(12));
    ts.set_flag("WEIGHT", Value::Float(2.0));
    ts.set_flag("LIT", true);
    let out = ts.expand("$COINS coins, $WEIGHT kg, lamp $LIT, [$UNSET]").expect("expand ok");
    assert_eq!(out, "12 coins, 2.0 kg, lamp ON, []");
}

#[test]
fn nested_branches() {
    let mut ts = interp();
    ts.set_flag("A", true);
    let tmpl = "$[[IF $A]]a$[[IF $B]]b$[[ELSE]]!b$[[ENDIF]]$[[ENDIF]]";
    assert_eq!(ts.expand(tmpl).expect("expand ok"), "a!b");
}

#[test]
fn lazy_conditions_are_parsed_when_reached() {
    let mut ts = interp();
    let tmpl = expansion::parse("$[[IF $GO]]$[[IF $NOPE(]]x$[[ENDIF]]$[[ENDIF]]done").expect("parse ok");
    let Block::Branch(branch) = &tmpl.blocks[0] else {
        panic!("expected branch");
    };
    assert!(matches!(branch.if_block.cond, Condition::Raw(_)));

    // the broken inner condition is never evaluated
    assert_eq!(ts.exec_template(&tmpl).expect("expand ok"), "done");

    ts.set_flag("GO", true);
    let err = ts.exec_template(&tmpl).expect_err("inner condition is broken");
    assert!(matches!(err, TsError::Template { line: 1, col: 12, .. }), "{err:?}");
}

#[test]
fn lazy_conditions_still_may_not_change_state() {
    let mut ts = interp();
    let tmpl = expansion::parse("$[[IF $INC(visits)]]again$[[ENDIF]]").expect("parse ok");
    assert!(matches!(ts.exec_template(&tmpl), Err(TsError::SideEffect { .. })));
    assert!(ts.get_flag("VISITS").is_none());
}

#[test]
fn conditions_update_last_result() {
    let mut ts = interp();
    ts.set_flag("N", Value::Int(3));
    ts.expand("$[[IF $N * 2]]x$[[ENDIF]]").expect("expand ok");
    assert_eq!(ts.last_result(), &Value::Int(6));
}

#[test]
fn template_errors_carry_the_file_name() {
    let mut ts = interp();
    ts.set_file(Some("rooms/cellar.txt"));
    let err = ts.expand("$[[IF $OUTPUT(boo)]]x$[[ENDIF]]").expect_err("side effect");
    assert!(err.to_string().starts_with("rooms/cellar.txt: around line 1, char 1"), "{err}");
}

#[test]
fn reader_input() {
    let mut ts = interp();
    ts.set_flag("NAME", "Ada");
    let out = ts.expand_reader("Welcome back, $NAME.".as_bytes()).expect("expand ok");
    assert_eq!(out, "Welcome back, Ada.");
}
