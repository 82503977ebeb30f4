// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! OMG IDL / ROS 2 IDL grammar parser and AST builder (C1 + C2).
//!
//! [`parse`] tokenizes `source` against [`IdlParser`] (a pest grammar) and
//! lowers the resulting parse tree into a [`Schema`](crate::schema::ast::Schema).
//! Name resolution, typedef-chain following, and constant evaluation are
//! left to [`crate::schema::resolver`]; this stage only normalizes
//! primitive spellings and folds literal/annotation syntax into
//! [`AnnotationValue`](crate::schema::ast::AnnotationValue).

use crate::core::{CodecError, Result};
use crate::schema::ast::{
    Annotation, AnnotationValue, Constant, Definition, Enum, Field, Module, Schema, Struct,
    Typedef, Union, UnionCase,
};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::collections::HashMap;

#[derive(Parser)]
#[grammar = "schema/parser/idl_parser/omg_idl.pest"]
struct IdlParser;

/// Parse `source` into an unresolved [`Schema`]. Run the result through
/// [`crate::schema::resolver::resolve`] before (de)serializing against it.
pub fn parse_idl(source: &str) -> Result<Schema> {
    tracing::debug!(bytes = source.len(), "parsing idl source");
    let mut pairs = IdlParser::parse(Rule::file, source)
        .map_err(|e| CodecError::parse("idl", e.to_string()))?;
    let file = pairs.next().expect("file rule always produces one pair");

    let mut definitions = Vec::new();
    for pair in file.into_inner() {
        if pair.as_rule() == Rule::definition {
            definitions.push(build_definition(pair)?);
        }
    }
    tracing::debug!(definitions = definitions.len(), "idl parse complete");
    Ok(Schema { definitions })
}

fn build_definition(pair: Pair<Rule>) -> Result<Definition> {
    let mut annotations = HashMap::new();
    let mut inner = pair.into_inner().peekable();
    while let Some(p) = inner.peek() {
        if p.as_rule() == Rule::annotation {
            let (name, ann) = build_annotation(inner.next().unwrap())?;
            annotations.insert(name, ann);
        } else {
            break;
        }
    }
    let body = inner.next().expect("definition body after annotations");
    match body.as_rule() {
        Rule::module_def => build_module(body, annotations),
        Rule::struct_def => build_struct(body, annotations),
        Rule::union_def => build_union(body, annotations),
        Rule::enum_def => build_enum(body, annotations),
        Rule::typedef_def => build_typedef(body, annotations),
        Rule::const_def => build_const(body, annotations),
        other => Err(CodecError::parse(
            "idl",
            format!("unexpected definition body {other:?}"),
        )),
    }
}

fn build_module(pair: Pair<Rule>, annotations: HashMap<String, Annotation>) -> Result<Definition> {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let mut definitions = Vec::new();
    for p in inner {
        if p.as_rule() == Rule::definition {
            definitions.push(build_definition(p)?);
        }
    }
    Ok(Definition::Module(Module {
        name,
        definitions,
        annotations,
    }))
}

fn build_struct(pair: Pair<Rule>, annotations: HashMap<String, Annotation>) -> Result<Definition> {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let mut fields = Vec::new();
    for member in inner {
        if member.as_rule() == Rule::member {
            fields.extend(build_member(member)?);
        }
    }
    Ok(Definition::Struct(Struct {
        name,
        fields,
        annotations,
    }))
}

fn build_member(pair: Pair<Rule>) -> Result<Vec<Field>> {
    let mut annotations = HashMap::new();
    let mut inner = pair.into_inner().peekable();
    while let Some(p) = inner.peek() {
        if p.as_rule() == Rule::annotation {
            let (name, ann) = build_annotation(inner.next().unwrap())?;
            annotations.insert(name, ann);
        } else {
            break;
        }
    }
    let type_spec = build_type_spec(inner.next().unwrap())?;
    let declarator_list = inner.next().unwrap();

    let mut fields = Vec::new();
    for declarator in declarator_list.into_inner() {
        let mut field = apply_type_spec(Field::new("", ""), &type_spec);
        field.annotations = annotations.clone();
        let mut d_inner = declarator.into_inner();
        field.name = d_inner.next().unwrap().as_str().to_string();
        for dim in d_inner {
            if dim.as_rule() == Rule::fixed_array_size {
                let n: usize = dim
                    .into_inner()
                    .next()
                    .unwrap()
                    .as_str()
                    .parse()
                    .map_err(|_| CodecError::parse("idl", "invalid array size"))?;
                field.array_lengths.push(n);
            }
        }
        fields.push(field);
    }
    Ok(fields)
}

/// Result of lowering a `type_spec` parse node: a base type name plus
/// whatever sequence/string-bound attributes it carries, independent of any
/// particular declarator.
struct TypeSpec {
    type_name: String,
    is_sequence: bool,
    sequence_bound: Option<usize>,
    string_upper_bound: Option<usize>,
}

fn apply_type_spec(mut field: Field, spec: &TypeSpec) -> Field {
    field.type_name = spec.type_name.clone();
    field.is_sequence = spec.is_sequence;
    field.sequence_bound = spec.sequence_bound;
    field.string_upper_bound = spec.string_upper_bound;
    field
}

fn build_type_spec(pair: Pair<Rule>) -> Result<TypeSpec> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::sequence_type => {
            let mut seq_inner = inner.into_inner();
            let element = build_type_spec(seq_inner.next().unwrap())?;
            let bound = seq_inner
                .next()
                .map(|n| n.as_str().parse::<usize>())
                .transpose()
                .map_err(|_| CodecError::parse("idl", "invalid sequence bound"))?;
            Ok(TypeSpec {
                type_name: element.type_name,
                is_sequence: true,
                sequence_bound: bound,
                string_upper_bound: element.string_upper_bound,
            })
        }
        Rule::string_type => {
            let bound = inner
                .into_inner()
                .next()
                .map(|n| n.as_str().parse::<usize>())
                .transpose()
                .map_err(|_| CodecError::parse("idl", "invalid string bound"))?;
            Ok(TypeSpec {
                type_name: "string".to_string(),
                is_sequence: false,
                sequence_bound: None,
                string_upper_bound: bound,
            })
        }
        Rule::wstring_type => {
            let bound = inner
                .into_inner()
                .next()
                .map(|n| n.as_str().parse::<usize>())
                .transpose()
                .map_err(|_| CodecError::parse("idl", "invalid wstring bound"))?;
            Ok(TypeSpec {
                type_name: "wstring".to_string(),
                is_sequence: false,
                sequence_bound: None,
                string_upper_bound: bound,
            })
        }
        Rule::base_type => {
            let spelling = normalize_spelling(inner.as_str());
            let canonical = crate::schema::ast::PrimitiveType::normalize(&spelling)
                .map(|p| p.canonical_name().to_string())
                .unwrap_or(spelling);
            Ok(TypeSpec {
                type_name: canonical,
                is_sequence: false,
                sequence_bound: None,
                string_upper_bound: None,
            })
        }
        Rule::scoped_name => Ok(TypeSpec {
            type_name: inner.as_str().to_string(),
            is_sequence: false,
            sequence_bound: None,
            string_upper_bound: None,
        }),
        other => Err(CodecError::parse(
            "idl",
            format!("unexpected type_spec node {other:?}"),
        )),
    }
}

/// Collapse the grammar's internal whitespace in a compound base-type
/// spelling (`"unsigned   long"`) to the single-space form
/// [`crate::schema::ast::PrimitiveType::normalize`] expects.
fn normalize_spelling(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn build_union(pair: Pair<Rule>, annotations: HashMap<String, Annotation>) -> Result<Definition> {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let switch_type_spec = build_type_spec(inner.next().unwrap())?;
    let mut cases = Vec::new();
    for member in inner {
        if member.as_rule() == Rule::union_member {
            cases.push(build_union_member(member)?);
        }
    }
    Ok(Definition::Union(Union {
        name,
        switch_type: switch_type_spec.type_name,
        cases,
        annotations,
    }))
}

fn build_union_member(pair: Pair<Rule>) -> Result<UnionCase> {
    let mut inner = pair.into_inner().peekable();
    let mut labels = Vec::new();
    let mut is_default = false;
    while let Some(p) = inner.peek() {
        if p.as_rule() == Rule::case_label {
            let label_pair = inner.next().unwrap();
            let label_inner = label_pair.into_inner().next().unwrap();
            match label_inner.as_rule() {
                Rule::case_value_label => {
                    let value_pair = label_inner.into_inner().next().unwrap();
                    labels.push(build_const_expr(value_pair)?);
                }
                Rule::default_label => is_default = true,
                other => {
                    return Err(CodecError::parse(
                        "idl",
                        format!("unexpected case label node {other:?}"),
                    ))
                }
            }
        } else {
            break;
        }
    }

    let mut annotations = HashMap::new();
    while let Some(p) = inner.peek() {
        if p.as_rule() == Rule::annotation {
            let (name, ann) = build_annotation(inner.next().unwrap())?;
            annotations.insert(name, ann);
        } else {
            break;
        }
    }

    let type_spec = build_type_spec(inner.next().unwrap())?;
    let declarator = inner.next().unwrap();
    let mut field = apply_type_spec(Field::new("", ""), &type_spec);
    field.annotations = annotations;
    let mut d_inner = declarator.into_inner();
    field.name = d_inner.next().unwrap().as_str().to_string();
    for dim in d_inner {
        if dim.as_rule() == Rule::fixed_array_size {
            let n: usize = dim
                .into_inner()
                .next()
                .unwrap()
                .as_str()
                .parse()
                .map_err(|_| CodecError::parse("idl", "invalid array size"))?;
            field.array_lengths.push(n);
        }
    }

    Ok(UnionCase {
        labels,
        is_default,
        field,
    })
}

fn build_enum(pair: Pair<Rule>, annotations: HashMap<String, Annotation>) -> Result<Definition> {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let mut enumerators = Vec::new();
    let mut next_value = 0i64;
    for enumerator in inner {
        if enumerator.as_rule() != Rule::enumerator {
            continue;
        }
        let mut e_inner = enumerator.into_inner().peekable();
        let mut e_annotations = HashMap::new();
        while let Some(p) = e_inner.peek() {
            if p.as_rule() == Rule::annotation {
                let (n, ann) = build_annotation(e_inner.next().unwrap())?;
                e_annotations.insert(n, ann);
            } else {
                break;
            }
        }
        let e_name = e_inner.next().unwrap().as_str().to_string();
        let value = match e_inner.next() {
            Some(expr) => build_const_expr(expr)?,
            None => AnnotationValue::Int(next_value),
        };
        if let AnnotationValue::Int(n) = &value {
            next_value = n + 1;
        } else {
            next_value += 1;
        }
        enumerators.push(Constant {
            name: e_name,
            type_name: "uint32".to_string(),
            value,
            annotations: e_annotations,
        });
    }
    Ok(Definition::Enum(Enum {
        name,
        enumerators,
        annotations,
    }))
}

fn build_typedef(
    pair: Pair<Rule>,
    annotations: HashMap<String, Annotation>,
) -> Result<Definition> {
    let mut inner = pair.into_inner();
    let type_spec = build_type_spec(inner.next().unwrap())?;
    let declarator_list = inner.next().unwrap();
    let declarator = declarator_list
        .into_inner()
        .next()
        .expect("typedef has exactly one declarator");
    let mut d_inner = declarator.into_inner();
    let name = d_inner.next().unwrap().as_str().to_string();
    let mut array_lengths = Vec::new();
    for dim in d_inner {
        if dim.as_rule() == Rule::fixed_array_size {
            let n: usize = dim
                .into_inner()
                .next()
                .unwrap()
                .as_str()
                .parse()
                .map_err(|_| CodecError::parse("idl", "invalid array size"))?;
            array_lengths.push(n);
        }
    }
    Ok(Definition::Typedef(Typedef {
        name,
        type_name: type_spec.type_name,
        array_lengths,
        is_sequence: type_spec.is_sequence,
        sequence_bound: type_spec.sequence_bound,
        annotations,
    }))
}

fn build_const(pair: Pair<Rule>, annotations: HashMap<String, Annotation>) -> Result<Definition> {
    let mut inner = pair.into_inner();
    let type_spec = build_type_spec(inner.next().unwrap())?;
    let name = inner.next().unwrap().as_str().to_string();
    let value = build_const_expr(inner.next().unwrap())?;
    Ok(Definition::Constant(Constant {
        name,
        type_name: type_spec.type_name,
        value,
        annotations,
    }))
}

/// Fold a `const_expr` (a sum of literals/prior-constant/enumerator-reference
/// terms) into a single value. Pure-literal sums are evaluated eagerly here;
/// any term that is an unresolved identifier is instead carried forward as
/// an `AnnotationValue::Expr`, for the resolver to evaluate once it has a
/// constant table to resolve identifiers against.
fn build_const_expr(pair: Pair<Rule>) -> Result<AnnotationValue> {
    let mut terms = pair.into_inner();
    let first = build_sum_term(terms.next().expect("const_expr has at least one term"))?;
    let mut acc = first;
    let mut op_iter = terms;
    loop {
        let Some(op_pair) = op_iter.next() else {
            break;
        };
        let op = op_pair.as_str().to_string();
        let term_pair = op_iter
            .next()
            .expect("sum_op always followed by a sum_term");
        let term = build_sum_term(term_pair)?;
        acc = combine(acc, &op, term)?;
    }
    Ok(acc)
}

fn combine(lhs: AnnotationValue, op: &str, rhs: AnnotationValue) -> Result<AnnotationValue> {
    match (&lhs, &rhs) {
        (AnnotationValue::String(a), AnnotationValue::String(b)) if op == "+" => {
            Ok(AnnotationValue::String(format!("{a}{b}")))
        }
        (AnnotationValue::Int(a), AnnotationValue::Int(b)) => Ok(AnnotationValue::Int(if op == "+"
        {
            a + b
        } else {
            a - b
        })),
        (AnnotationValue::Float(a), AnnotationValue::Float(b)) => {
            Ok(AnnotationValue::Float(if op == "+" { a + b } else { a - b }))
        }
        _ => Ok(AnnotationValue::Expr(
            Box::new(lhs),
            op.to_string(),
            Box::new(rhs),
        )),
    }
}

fn build_sum_term(pair: Pair<Rule>) -> Result<AnnotationValue> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::literal => build_literal(inner),
        Rule::scoped_name => Ok(AnnotationValue::Identifier(inner.as_str().to_string())),
        other => Err(CodecError::parse(
            "idl",
            format!("unexpected sum_term node {other:?}"),
        )),
    }
}

fn build_literal(pair: Pair<Rule>) -> Result<AnnotationValue> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::float_literal => inner
            .as_str()
            .parse::<f64>()
            .map(AnnotationValue::Float)
            .map_err(|_| CodecError::parse("idl", "invalid float literal")),
        Rule::int_literal => inner
            .as_str()
            .parse::<i64>()
            .map(AnnotationValue::Int)
            .map_err(|_| CodecError::parse("idl", "invalid integer literal")),
        Rule::bool_literal => Ok(AnnotationValue::Bool(inner.as_str() == "true")),
        Rule::string_literal => {
            let mut s = String::new();
            for part in inner.into_inner() {
                s.push_str(&unescape(part.as_str()));
            }
            Ok(AnnotationValue::String(s))
        }
        other => Err(CodecError::parse(
            "idl",
            format!("unexpected literal node {other:?}"),
        )),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn build_annotation(pair: Pair<Rule>) -> Result<(String, Annotation)> {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let Some(params) = inner.next() else {
        return Ok((name, Annotation::NoParams));
    };
    let body = params.into_inner().next().unwrap();
    match body.as_rule() {
        Rule::named_param_list => {
            let mut map = HashMap::new();
            for named_param in body.into_inner() {
                let mut p_inner = named_param.into_inner();
                let pname = p_inner.next().unwrap().as_str().to_string();
                let pvalue = build_const_expr(p_inner.next().unwrap())?;
                map.insert(pname, pvalue);
            }
            Ok((name, Annotation::NamedParams(map)))
        }
        Rule::const_expr => {
            let value = build_const_expr(body)?;
            Ok((name, Annotation::ConstParam(value)))
        }
        other => Err(CodecError::parse(
            "idl",
            format!("unexpected annotation param node {other:?}"),
        )),
    }
}
