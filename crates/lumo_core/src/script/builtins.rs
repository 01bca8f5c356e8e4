//! Core builtins: arithmetic, output, sequencing, variables and `for`.

use super::engine::{Engine, ScriptError, ScriptResult};
use super::value::{Value, ValueId};

type Args<'a> = &'a [Option<ValueId>];

pub(crate) fn register(engine: &mut Engine) {
    engine.add_function("+", plus);
    engine.add_function("-", minus);
    engine.add_function("*", multiply);
    engine.add_function("/", divide);
    engine.add_function("display", display);
    engine.add_function("begin", begin);
    engine.add_function("list", list);
    engine.add_function("set", set);
    engine.add_function("unset", unset);

    engine.add_macro("for", for_loop);
}

fn numbers(engine: &Engine, name: &str, args: Args) -> ScriptResult<Vec<f64>> {
    args.iter().map(|&arg| engine.expect_number(arg, name)).collect()
}

/// Left fold over the arguments; nil when there are none.
fn reduce(
    engine: &mut Engine,
    name: &str,
    args: Args,
    op: fn(f64, f64) -> f64,
) -> ScriptResult<Option<ValueId>> {
    let values = numbers(engine, name, args)?;
    Ok(values
        .split_first()
        .map(|(&first, rest)| rest.iter().fold(first, |acc, &n| op(acc, n)))
        .map(|n| engine.number(n)))
}

fn plus(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    let sum = numbers(engine, "+", args)?.into_iter().sum();
    Ok(Some(engine.number(sum)))
}

fn minus(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    if let [only] = args {
        let n = engine.expect_number(*only, "-")?;
        return Ok(Some(engine.number(-n)));
    }
    reduce(engine, "-", args, |a, b| a - b)
}

fn multiply(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    reduce(engine, "*", args, |a, b| a * b)
}

fn divide(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    reduce(engine, "/", args, |a, b| a / b)
}

fn display(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    let line = args
        .iter()
        .map(|&arg| engine.display_string(arg))
        .collect::<Vec<_>>()
        .join(" ");
    engine.write_line(&line)?;
    Ok(None)
}

fn begin(_engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    Ok(args.last().copied().flatten())
}

fn list(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    let items = args
        .iter()
        .map(|&arg| engine.expect_value(arg, "list"))
        .collect::<ScriptResult<Vec<_>>>()?;
    Ok(Some(engine.list(items)))
}

fn set(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    let [name, value] = args else {
        return Err(ScriptError::Arity {
            name: "set",
            expected: "2",
            found: args.len(),
        });
    };
    let name = engine.expect_str(*name, "set")?.to_string();
    let value = engine.expect_value(*value, "set")?;
    let owned = engine.to_value(value);
    engine.set_variable(name, owned);
    Ok(Some(value))
}

fn unset(engine: &mut Engine, args: Args) -> ScriptResult<Option<ValueId>> {
    let [name] = args else {
        return Err(ScriptError::Arity {
            name: "unset",
            expected: "1",
            found: args.len(),
        });
    };
    let name = engine.expect_str(*name, "unset")?.to_string();
    engine.unset_variable(&name);
    Ok(None)
}

/// `(for (var from to [step]) body...)`
///
/// The control list is read structurally; only its bounds are evaluated.
fn for_loop(engine: &mut Engine, params: &[ValueId]) -> ScriptResult<Option<ValueId>> {
    let Some((&control, body)) = params.split_first() else {
        return Err(ScriptError::Arity {
            name: "for",
            expected: "at least 1",
            found: 0,
        });
    };

    let control = engine.expect_list(Some(control), "for")?;
    if !(3..=4).contains(&control.len()) {
        return Err(ScriptError::Arity {
            name: "for",
            expected: "3 or 4 loop",
            found: control.len(),
        });
    }

    let var = engine.expect_str(Some(control[0]), "for")?.to_string();
    let mut bound = |id: ValueId| -> ScriptResult<f64> {
        let value = engine.eval(id)?;
        engine.expect_number(value, "for")
    };
    let from = bound(control[1])?;
    let to = bound(control[2])?;
    let step = match control.get(3) {
        Some(&id) => bound(id)?,
        None => 1.0,
    };
    if !(step > 0.0) {
        return Err(ScriptError::InvalidLoopStep(step));
    }

    let mut n = from;
    let mut result = None;
    engine.set_variable(var.as_str(), Value::Number(n));
    while n <= to {
        for &form in body {
            result = engine.eval(form)?;
        }
        n += step;
        engine.set_variable(var.as_str(), Value::Number(n));
    }
    Ok(result)
}
