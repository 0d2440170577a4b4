//! Composable boolean predicates over typed fields.
//!
//! A [`Predicate`] is an immutable tree of comparison leaves joined by AND and
//! OR. Its `Display` output is the predicate text handed to the store:
//!
//! - leaves render as `column OP operand`,
//! - combinations render as `(lhs) AND (rhs)` / `(lhs) OR (rhs)`,
//! - every leaf on a kind slot is followed by ` AND mimetype = '<tag>'`, since
//!   the attribute relation reuses slot columns across kinds.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use crate::field::{ContactsField, DataField, Field, FieldDescriptor, RawContactsField};
use crate::kind::Kind;
use crate::value::{mask_str, quote, Value};

/// Escape character used in every `LIKE`.
pub const LIKE_ESCAPE: char = '\\';

/// Column holding the kind tag on attribute rows.
pub const KIND_COLUMN: &str = "mimetype";

/// Comparison operator of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    Like,
    NotLike,
    IsNull,
    IsNotNull,
}

impl MatchOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::GreaterThan => ">",
            MatchOp::GreaterThanOrEqual => ">=",
            MatchOp::LessThan => "<",
            MatchOp::LessThanOrEqual => "<=",
            MatchOp::In => "IN",
            MatchOp::NotIn => "NOT IN",
            MatchOp::Like => "LIKE",
            MatchOp::NotLike => "NOT LIKE",
            MatchOp::IsNull => "IS NULL",
            MatchOp::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, MatchOp::Like | MatchOp::NotLike)
    }
}

/// Boolean connective of an inner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombineOp {
    And,
    Or,
}

impl fmt::Display for CombineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CombineOp::And => "AND",
            CombineOp::Or => "OR",
        })
    }
}

/// A `LIKE` pattern: a caller value placed between fixed wildcard
/// decorations. Only the value is ever escaped or redacted.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub before: &'static str,
    pub value: String,
    pub after: &'static str,
    /// Escape `%` and `_` in `value` when rendering.
    pub escaped: bool,
}

impl Pattern {
    fn decorated(before: &'static str, value: impl Into<Value>, after: &'static str) -> Self {
        Self {
            before,
            value: value_text(&value.into()),
            after,
            escaped: true,
        }
    }

    /// Matches the value exactly, ignoring ASCII case.
    pub fn exact(value: impl Into<Value>) -> Self {
        Self::decorated("", value, "")
    }

    pub fn prefix(value: impl Into<Value>) -> Self {
        Self::decorated("", value, "%")
    }

    pub fn suffix(value: impl Into<Value>) -> Self {
        Self::decorated("%", value, "")
    }

    pub fn infix(value: impl Into<Value>) -> Self {
        Self::decorated("%", value, "%")
    }

    /// A caller-written pattern, used verbatim.
    pub fn raw(pattern: impl Into<String>) -> Self {
        Self {
            before: "",
            value: pattern.into(),
            after: "",
            escaped: false,
        }
    }

    /// The full pattern text, before SQL quoting.
    pub fn text(&self) -> String {
        let value = if self.escaped {
            escape_wildcards(&self.value)
        } else {
            self.value.clone()
        };
        format!("{}{}{}", self.before, value, self.after)
    }

    fn redacted(&self, mask: char) -> Self {
        Self {
            value: mask_str(&self.value, mask),
            ..self.clone()
        }
    }
}

/// Right-hand side of a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Null checks take no operand.
    None,
    Scalar(Value),
    List(Vec<Value>),
    Pattern(Pattern),
}

impl Operand {
    fn redacted(&self, mask: char) -> Self {
        match self {
            Operand::None => Operand::None,
            Operand::Scalar(v) => Operand::Scalar(v.redacted(mask)),
            Operand::List(values) => {
                Operand::List(values.iter().map(|v| v.redacted(mask)).collect())
            }
            Operand::Pattern(p) => Operand::Pattern(p.redacted(mask)),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Scalar(v) => write!(f, "{}", v),
            Operand::List(values) => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str(")")
            }
            Operand::Pattern(p) => f.write_str(&quote(&p.text())),
        }
    }
}

/// Family-erased predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `field op operand`
    Match {
        field: FieldDescriptor,
        op: MatchOp,
        operand: Operand,
    },
    /// `(lhs) op (rhs)`
    Combine {
        lhs: Box<Expr>,
        op: CombineOp,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn combine(lhs: Expr, op: CombineOp, rhs: Expr) -> Expr {
        Expr::Combine {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// Kinds of every slot field in the tree.
    pub fn kinds(&self) -> BTreeSet<Kind> {
        let mut kinds = BTreeSet::new();
        self.collect_kinds(&mut kinds);
        kinds
    }

    fn collect_kinds(&self, kinds: &mut BTreeSet<Kind>) {
        match self {
            Expr::Match { field, .. } => {
                if let Some(kind) = &field.kind {
                    kinds.insert(kind.clone());
                }
            }
            Expr::Combine { lhs, rhs, .. } => {
                lhs.collect_kinds(kinds);
                rhs.collect_kinds(kinds);
            }
        }
    }

    /// Every field referenced in the tree, in preorder.
    pub fn fields(&self) -> Vec<&FieldDescriptor> {
        match self {
            Expr::Match { field, .. } => vec![field],
            Expr::Combine { lhs, rhs, .. } => {
                let mut fields = lhs.fields();
                fields.extend(rhs.fields());
                fields
            }
        }
    }

    /// Copy of the tree with every string operand masked.
    pub fn redacted(&self, mask: char) -> Expr {
        match self {
            Expr::Match { field, op, operand } => Expr::Match {
                field: field.clone(),
                op: *op,
                operand: operand.redacted(mask),
            },
            Expr::Combine { lhs, op, rhs } => {
                Expr::combine(lhs.redacted(mask), *op, rhs.redacted(mask))
            }
        }
    }

    /// Rewrites the tree onto other columns.
    ///
    /// `map` returns `None` for a field with no counterpart. Such a leaf is
    /// treated as unsatisfiable: an AND containing it is dropped entirely, an
    /// OR keeps its other side. Returns `None` if nothing survives.
    pub fn translate(
        &self,
        map: &dyn Fn(&FieldDescriptor) -> Option<FieldDescriptor>,
    ) -> Option<Expr> {
        match self {
            Expr::Match { field, op, operand } => map(field).map(|field| Expr::Match {
                field,
                op: *op,
                operand: operand.clone(),
            }),
            Expr::Combine { lhs, op, rhs } => {
                let lhs = lhs.translate(map);
                let rhs = rhs.translate(map);
                match (op, lhs, rhs) {
                    (_, Some(l), Some(r)) => Some(Expr::combine(l, *op, r)),
                    (CombineOp::Or, Some(side), None) | (CombineOp::Or, None, Some(side)) => {
                        Some(side)
                    }
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Combine { lhs, op, rhs } => write!(f, "({}) {} ({})", lhs, op, rhs),
            Expr::Match { field, op, operand } => {
                match operand {
                    Operand::None => write!(f, "{} {}", field.column, op.as_sql())?,
                    _ => write!(f, "{} {} {}", field.column, op.as_sql(), operand)?,
                }
                if op.is_pattern() {
                    write!(f, " ESCAPE '{}'", LIKE_ESCAPE)?;
                }
                if let Some(kind) = &field.kind {
                    write!(f, " AND {} = {}", KIND_COLUMN, quote(kind.tag()))?;
                }
                Ok(())
            }
        }
    }
}

/// A predicate over fields of one family `F`.
///
/// Predicates of different families are distinct types, so a raw contacts
/// predicate cannot end up in a contacts query by accident.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate<F> {
    expr: Expr,
    _family: PhantomData<fn() -> F>,
}

impl<F: Field> Predicate<F> {
    pub(crate) fn leaf(field: &F, op: MatchOp, operand: Operand) -> Self {
        Self::from_expr(Expr::Match {
            field: field.descriptor().clone(),
            op,
            operand,
        })
    }

    fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _family: PhantomData,
        }
    }

    /// `(self) AND (other)`. Returns `self` unchanged when `other` is `None`.
    pub fn and(self, other: impl Into<Option<Predicate<F>>>) -> Self {
        self.combine(CombineOp::And, other.into())
    }

    /// `(self) OR (other)`. Returns `self` unchanged when `other` is `None`.
    pub fn or(self, other: impl Into<Option<Predicate<F>>>) -> Self {
        self.combine(CombineOp::Or, other.into())
    }

    fn combine(self, op: CombineOp, other: Option<Predicate<F>>) -> Self {
        match other {
            Some(other) => Self::from_expr(Expr::combine(self.expr, op, other.expr)),
            None => self,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    pub fn kinds(&self) -> BTreeSet<Kind> {
        self.expr.kinds()
    }

    /// Copy with every string operand replaced by `*` characters.
    pub fn redacted(&self) -> Self {
        self.redacted_with('*')
    }

    pub fn redacted_with(&self, mask: char) -> Self {
        Self::from_expr(self.expr.redacted(mask))
    }
}

impl Predicate<DataField> {
    /// The part of this predicate that can be evaluated against raw contacts
    /// alone, for raw contacts with no attribute rows.
    pub fn in_raw_contacts_table(&self) -> Option<Predicate<RawContactsField>> {
        self.expr
            .translate(&|d| {
                DataField(d.clone())
                    .in_raw_contacts_table()
                    .map(|f| f.descriptor().clone())
            })
            .map(Predicate::from_expr)
    }

    /// The part of this predicate that can be evaluated against contacts
    /// alone, for contacts with no attribute rows.
    pub fn in_contacts_table(&self) -> Option<Predicate<ContactsField>> {
        self.expr
            .translate(&|d| {
                DataField(d.clone())
                    .in_contacts_table()
                    .map(|f| f.descriptor().clone())
            })
            .map(Predicate::from_expr)
    }
}

impl<F> fmt::Display for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

impl<F> From<Predicate<F>> for Expr {
    fn from(p: Predicate<F>) -> Self {
        p.expr
    }
}

/// ORs the predicates produced for each item, right-associatively.
/// Returns `None` for an empty input.
///
/// Works equally over values (`where_or(["a", "b"], |v| f.starts_with(v))`)
/// and over field sets (`where_or(name::all(), |f| f.contains("jo"))`).
pub fn where_or<F, T, G>(items: impl IntoIterator<Item = T>, make: G) -> Option<Predicate<F>>
where
    F: Field,
    G: FnMut(T) -> Predicate<F>,
{
    reduce(items, make, CombineOp::Or)
}

/// ANDs the predicates produced for each item, right-associatively.
/// Returns `None` for an empty input.
pub fn where_and<F, T, G>(items: impl IntoIterator<Item = T>, make: G) -> Option<Predicate<F>>
where
    F: Field,
    G: FnMut(T) -> Predicate<F>,
{
    reduce(items, make, CombineOp::And)
}

fn reduce<F, T, G>(
    items: impl IntoIterator<Item = T>,
    make: G,
    op: CombineOp,
) -> Option<Predicate<F>>
where
    F: Field,
    G: FnMut(T) -> Predicate<F>,
{
    let predicates: Vec<Predicate<F>> = items.into_iter().map(make).collect();
    predicates
        .into_iter()
        .rev()
        .reduce(|acc, p| p.combine(op, Some(acc)))
}

/// Text of a value as it appears inside a pattern.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Int64(i) => i.to_string(),
        Value::Float64(f) => f.to_string(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

/// Prefix `%` and `_` with the escape character.
pub fn escape_wildcards(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
