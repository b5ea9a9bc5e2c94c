use log::{info, warn};

use super::Interpreter;
use crate::registry::{self, Builtin};
use crate::value::Value;
use crate::world::World;

/// Call the built-in `name` with already evaluated arguments.
///
/// Parsed ASTs are checked against the registry, so an unknown name or a
/// short argument list only comes from a hand-built tree. Missing arguments
/// read as the zero value and unknown functions return it.
pub(super) fn call<W: World>(interp: &mut Interpreter<W>, name: &str, args: &[Value]) -> Value {
    let Some(sig) = registry::lookup(name) else {
        warn!("call to undefined built-in ${name}(); returning zero value");
        return Value::default();
    };
    if !sig.accepts(args.len()) {
        warn!("${}() called with {} argument(s); padding with zero values", sig.name, args.len());
    }
    let arg = |idx: usize| args.get(idx).cloned().unwrap_or_default();

    match sig.builtin {
        Builtin::Add => arg(0).add(&arg(1)),
        Builtin::Sub => arg(0).subtract(&arg(1)),
        Builtin::Mult => arg(0).multiply(&arg(1)),
        Builtin::Div => arg(0).divide(&arg(1)),
        Builtin::Neg => arg(0).negate(),
        Builtin::Or => arg(0).or(&arg(1)),
        Builtin::And => arg(0).and(&arg(1)),
        Builtin::Not | Builtin::FlagDisabled => arg(0).not(),
        Builtin::FlagEnabled => Value::Bool(arg(0).cast_to_bool()),
        Builtin::FlagIs => Value::Bool(arg(0).equal_to(&arg(1))),
        Builtin::FlagLessThan => Value::Bool(arg(0).less_than(&arg(1))),
        Builtin::FlagGreaterThan => Value::Bool(arg(0).greater_than(&arg(1))),
        Builtin::Enable => store(interp, &arg(0), Value::Bool(true)),
        Builtin::Disable => store(interp, &arg(0), Value::Bool(false)),
        Builtin::Toggle => {
            let current = interp.flags.get(&label(&arg(0))).cloned().unwrap_or_default();
            store(interp, &arg(0), current.not())
        },
        Builtin::Inc | Builtin::Dec => {
            let amount = args.get(1).cloned().unwrap_or(Value::Int(1));
            let current = interp.flags.get(&label(&arg(0))).cloned().unwrap_or_default();
            let new = if sig.builtin == Builtin::Inc {
                current.add(&amount)
            } else {
                current.subtract(&amount)
            };
            store(interp, &arg(0), new)
        },
        Builtin::Set => store(interp, &arg(0), arg(1)),
        Builtin::InInven => Value::Bool(interp.world.in_inventory(&label(&arg(0)))),
        Builtin::Move => {
            let (target, dest) = (label(&arg(0)), label(&arg(1)));
            info!("└─ builtin: $MOVE({target}, {dest})");
            Value::Bool(interp.world.move_to(&target, &dest))
        },
        Builtin::Output => Value::Bool(interp.world.output(&arg(0).cast_to_string())),
    }
}

/// Flag and item labels are the upper-cased string form of the argument.
fn label(value: &Value) -> String {
    value.cast_to_string().to_uppercase()
}

fn store<W: World>(interp: &mut Interpreter<W>, name: &Value, new: Value) -> Value {
    let flag = label(name);
    info!("└─ builtin: flag {flag} = {new}");
    interp.flags.insert(flag, new.clone());
    new
}
