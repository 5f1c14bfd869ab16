//! Evaluation of parsed location paths against a [`Document`]

use super::document::{Document, Item, NodeKind};
use super::parser::{Axis, CompareOp, Expr, Function, LocationPath, NodeTest, Step};

#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<Item>),
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Context item plus its 1-based position within the current step's result
#[derive(Debug, Clone, Copy)]
struct Context {
    item: Item,
    position: usize,
    size: usize,
}

pub(crate) fn select(doc: &Document, path: &LocationPath) -> Vec<Item> {
    eval_path(doc, path, Item::Node(doc.root()))
}

fn eval_path(doc: &Document, path: &LocationPath, origin: Item) -> Vec<Item> {
    let mut current = if path.absolute {
        vec![Item::Node(doc.root())]
    } else {
        vec![origin]
    };

    for step in &path.steps {
        let mut next = Vec::new();
        for item in &current {
            let candidates = axis_candidates(doc, step, *item);
            next.extend(apply_predicates(doc, &step.predicates, candidates));
        }
        next.sort_by_key(|item| item.order_key());
        next.dedup();
        current = next;
    }

    current
}

fn axis_candidates(doc: &Document, step: &Step, item: Item) -> Vec<Item> {
    let items: Vec<Item> = match (step.axis, item) {
        (Axis::SelfNode, _) => vec![item],
        (Axis::Parent, Item::Attr(id, _)) => vec![Item::Node(id)],
        (Axis::Parent, Item::Node(id)) => doc.parent(id).map(Item::Node).into_iter().collect(),
        (_, Item::Attr(..)) => Vec::new(),
        (Axis::Child, Item::Node(id)) => doc.children(id).iter().copied().map(Item::Node).collect(),
        (Axis::DescendantOrSelf, Item::Node(id)) => doc
            .descendants_or_self(id)
            .into_iter()
            .map(Item::Node)
            .collect(),
        (Axis::Attribute, Item::Node(id)) => (0..doc.attributes(id).len())
            .map(|index| Item::Attr(id, index))
            .collect(),
    };

    items
        .into_iter()
        .filter(|candidate| matches_test(doc, step.axis, &step.test, *candidate))
        .collect()
}

fn matches_test(doc: &Document, axis: Axis, test: &NodeTest, item: Item) -> bool {
    match (item, test) {
        (_, NodeTest::Node) => true,
        (Item::Attr(id, index), NodeTest::Name(name)) => {
            axis == Axis::Attribute && doc.attributes(id)[index].0 == *name
        }
        (Item::Attr(..), NodeTest::Any) => axis == Axis::Attribute,
        (Item::Attr(..), NodeTest::Text) => false,
        (Item::Node(id), NodeTest::Name(name)) => {
            doc.kind(id) == NodeKind::Element && doc.name(id) == name
        }
        (Item::Node(id), NodeTest::Any) => doc.kind(id) == NodeKind::Element,
        (Item::Node(id), NodeTest::Text) => doc.kind(id) == NodeKind::Text,
    }
}

fn apply_predicates(doc: &Document, predicates: &[Expr], mut items: Vec<Item>) -> Vec<Item> {
    for predicate in predicates {
        let size = items.len();
        items = items
            .into_iter()
            .enumerate()
            .filter(|(index, item)| {
                let context = Context {
                    item: *item,
                    position: index + 1,
                    size,
                };
                match eval_expr(doc, predicate, context) {
                    // A bare number selects by position
                    Value::Num(n) => n == context.position as f64,
                    value => to_bool(&value),
                }
            })
            .map(|(_, item)| item)
            .collect();
    }
    items
}

fn eval_expr(doc: &Document, expr: &Expr, context: Context) -> Value {
    match expr {
        Expr::Path(path) => Value::Nodes(eval_path(doc, path, context.item)),
        Expr::Literal(s) => Value::Str(s.clone()),
        Expr::Number(n) => Value::Num(*n),
        Expr::Or(left, right) => Value::Bool(
            to_bool(&eval_expr(doc, left, context)) || to_bool(&eval_expr(doc, right, context)),
        ),
        Expr::And(left, right) => Value::Bool(
            to_bool(&eval_expr(doc, left, context)) && to_bool(&eval_expr(doc, right, context)),
        ),
        Expr::Compare(left, op, right) => Value::Bool(compare(
            doc,
            eval_expr(doc, left, context),
            *op,
            eval_expr(doc, right, context),
        )),
        Expr::Call(function, args) => {
            let arg = |i: usize| to_string(doc, &eval_expr(doc, &args[i], context));
            match function {
                Function::Contains => Value::Bool(arg(0).contains(&arg(1))),
                Function::StartsWith => Value::Bool(arg(0).starts_with(&arg(1))),
                Function::Last => Value::Num(context.size as f64),
                Function::Position => Value::Num(context.position as f64),
                Function::Not => Value::Bool(!to_bool(&eval_expr(doc, &args[0], context))),
            }
        }
    }
}

/// XPath 1.0 comparison: node-sets compare existentially against the
/// other operand
fn compare(doc: &Document, left: Value, op: CompareOp, right: Value) -> bool {
    match (left, right) {
        (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|a| {
            let a = doc.string_value(*a);
            r.iter().any(|b| op.holds(a.as_str(), doc.string_value(*b).as_str()))
        }),
        (Value::Nodes(nodes), other) | (other, Value::Nodes(nodes)) => match other {
            Value::Bool(b) => op.holds(&!nodes.is_empty(), &b),
            Value::Num(n) => nodes
                .iter()
                .any(|item| op.holds(&parse_number(&doc.string_value(*item)), &n)),
            Value::Str(s) => nodes
                .iter()
                .any(|item| op.holds(doc.string_value(*item).as_str(), s.as_str())),
            Value::Nodes(_) => false,
        },
        (left, right) => match (&left, &right) {
            (Value::Bool(_), _) | (_, Value::Bool(_)) => op.holds(&to_bool(&left), &to_bool(&right)),
            (Value::Num(_), _) | (_, Value::Num(_)) => {
                op.holds(&to_number(doc, &left), &to_number(doc, &right))
            }
            _ => op.holds(to_string(doc, &left).as_str(), to_string(doc, &right).as_str()),
        },
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Nodes(nodes) => !nodes.is_empty(),
        Value::Str(s) => !s.is_empty(),
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Bool(b) => *b,
    }
}

fn to_string(doc: &Document, value: &Value) -> String {
    match value {
        Value::Nodes(nodes) => nodes
            .first()
            .map(|item| doc.string_value(*item))
            .unwrap_or_default(),
        Value::Str(s) => s.clone(),
        Value::Num(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
        Value::Num(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
    }
}

fn to_number(doc: &Document, value: &Value) -> f64 {
    match value {
        Value::Num(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => parse_number(&to_string(doc, other)),
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}
