//! The Compiler (§4.4): turns a (now-indexed) schema node into a tree of
//! [`Instruction`]s, memoized per schema node to break cycles.
//!
//! Grounded on the teacher's `compiler.rs` (the `Context`/`build_validator`
//! split) and `keywords/mod.rs`'s per-draft keyword dispatch — consolidated
//! here into one ordered walk per §4.4 rather than a `get_for_draft` match
//! table, since `schemato` targets a single draft.
use crate::error::{CompileError, CompileResult};
use crate::index::{Location, SchemaIndex};
use crate::instruction::{handle, ContainsSpec, DynamicRefSpec, Instruction, InstructionHandle, Memo};
use crate::options::{CustomFormats, ValidationOptions};
use crate::pointer::Pointer;
use crate::regex_ext::to_rust_regex;
use crate::resolver;
use crate::retriever::Retrieve;
use crate::uri::Uri;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

pub(crate) struct CompiledSchemaData {
    pub(crate) root: InstructionHandle,
    pub(crate) index: SchemaIndex,
    pub(crate) memo: Memo,
    pub(crate) custom_formats: CustomFormats,
}

struct CompileContext<'a> {
    index: SchemaIndex,
    memo: Memo,
    retriever: &'a dyn Retrieve,
    validate_formats: bool,
}

pub(crate) fn compile_schema(schema: Value, options: &ValidationOptions) -> CompileResult<CompiledSchemaData> {
    let root_uri = Uri::default_base();
    let mut ctx = CompileContext {
        index: SchemaIndex::new(),
        memo: Memo::new(),
        retriever: options.retriever.as_ref(),
        validate_formats: options.validate_formats,
    };
    for (uri, resource) in &options.resources {
        ctx.index.index_document(uri.clone(), Arc::new(resource.clone()))?;
    }
    ctx.index.index_document(root_uri.clone(), Arc::new(schema))?;
    let root_location = Location {
        doc: root_uri.clone(),
        pointer: Pointer::root(),
    };
    let root = compile_node(&mut ctx, root_location, root_uri, Vec::new())?;
    Ok(CompiledSchemaData {
        root,
        index: ctx.index,
        memo: ctx.memo,
        custom_formats: options.custom_formats.clone(),
    })
}

fn regex_at(pointer: &Pointer, pattern: &str) -> CompileResult<Regex> {
    Regex::new(&to_rust_regex(pattern))
        .map_err(|cause| CompileError::invalid_regex(pointer.clone(), pattern, &cause))
}

fn as_usize(value: &Value) -> Option<usize> {
    value.as_u64().map(|n| n as usize)
}

/// Compile the schema node at `location`, or return its existing
/// [`Instruction`] handle if already compiled or in progress (§4.4 steps
/// 1-2 — the cycle-breaking placeholder).
fn compile_node(
    ctx: &mut CompileContext,
    location: Location,
    base: Uri,
    scopes: Vec<Uri>,
) -> CompileResult<InstructionHandle> {
    if let Some(existing) = ctx.memo.get(&location) {
        return Ok(Arc::clone(existing));
    }
    let placeholder = handle(Instruction::Sequence(Vec::new()));
    ctx.memo.insert(location.clone(), Arc::clone(&placeholder));

    let doc = location.doc.clone();
    let pointer = location.pointer.clone();

    let node = ctx
        .index
        .node_at(&location)
        .cloned()
        .ok_or_else(|| CompileError::new(pointer.clone(), "schema node vanished after indexing"))?;

    let node = resolver::normalize_boolean(&node).unwrap_or(node);

    let Value::Object(obj) = &node else {
        return Err(CompileError::invalid_schema(pointer.clone(), &node));
    };

    let mut base = base;
    let mut scopes = scopes;
    if let Some(id_value) = obj.get("$id") {
        if let Some(id) = id_value.as_str() {
            base = base.resolve(id);
            scopes.push(base.clone());
        }
    }

    let mut children: Vec<InstructionHandle> = Vec::new();

    // type
    if let Some(type_value) = obj.get("type") {
        children.push(handle(Instruction::Type(compile_type(type_value))));
    }

    // format
    if ctx.validate_formats {
        if let Some(Value::String(name)) = obj.get("format") {
            children.push(handle(Instruction::Format(name.clone())));
        }
    }

    // const + enum
    if let Some(value) = obj.get("const") {
        children.push(handle(Instruction::Const(value.clone())));
    }
    if let Some(Value::Array(options)) = obj.get("enum") {
        children.push(handle(Instruction::Enum(options.clone())));
    }

    // combinators
    if let Some(Value::Array(subs)) = obj.get("allOf") {
        let compiled = compile_each(ctx, subs.len(), &doc, &base, &scopes, &pointer, "allOf")?;
        children.push(handle(Instruction::AllOf(compiled)));
    }
    if let Some(Value::Array(subs)) = obj.get("anyOf") {
        let compiled = compile_each(ctx, subs.len(), &doc, &base, &scopes, &pointer, "anyOf")?;
        children.push(handle(Instruction::AnyOf(compiled)));
    }
    if let Some(Value::Array(subs)) = obj.get("oneOf") {
        let compiled = compile_each(ctx, subs.len(), &doc, &base, &scopes, &pointer, "oneOf")?;
        children.push(handle(Instruction::OneOf(compiled)));
    }
    if obj.contains_key("not") {
        let child = compile_child(ctx, &doc, &base, &scopes, &pointer.push("not"))?;
        children.push(handle(Instruction::Not(child)));
    }

    // required + object checks
    if let Some(Value::Array(names)) = obj.get("required") {
        let names = names
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        children.push(handle(Instruction::Required(names)));
    }
    if has_object_keywords(obj) {
        children.push(handle(compile_object_checks(ctx, obj, &doc, &base, &scopes, &pointer)?));
    }

    // if / then / else
    if obj.contains_key("if") {
        let if_ = compile_child(ctx, &doc, &base, &scopes, &pointer.push("if"))?;
        let then_ = obj
            .contains_key("then")
            .then(|| compile_child(ctx, &doc, &base, &scopes, &pointer.push("then")))
            .transpose()?;
        let else_ = obj
            .contains_key("else")
            .then(|| compile_child(ctx, &doc, &base, &scopes, &pointer.push("else")))
            .transpose()?;
        children.push(handle(Instruction::IfThenElse { if_, then_, else_ }));
    }

    // array checks
    if has_array_keywords(obj) {
        children.push(handle(compile_array_checks(ctx, obj, &doc, &base, &scopes, &pointer)?));
    }

    // number checks — kept as the original `serde_json::Number` rather than
    // lossily converted to f64, so minimum/maximum on integers beyond 2^53
    // still compare exactly (helpers::number_ge and friends).
    if let Some(Value::Number(n)) = obj.get("minimum") {
        children.push(handle(Instruction::Minimum(n.clone())));
    }
    if let Some(Value::Number(n)) = obj.get("maximum") {
        children.push(handle(Instruction::Maximum(n.clone())));
    }
    if let Some(Value::Number(n)) = obj.get("exclusiveMinimum") {
        children.push(handle(Instruction::ExclusiveMinimum(n.clone())));
    }
    if let Some(Value::Number(n)) = obj.get("exclusiveMaximum") {
        children.push(handle(Instruction::ExclusiveMaximum(n.clone())));
    }
    if let Some(Value::Number(n)) = obj.get("multipleOf") {
        children.push(handle(Instruction::MultipleOf(n.clone())));
    }

    // string checks
    if let Some(n) = obj.get("minLength").and_then(as_usize) {
        children.push(handle(Instruction::MinLength(n)));
    }
    if let Some(n) = obj.get("maxLength").and_then(as_usize) {
        children.push(handle(Instruction::MaxLength(n)));
    }
    if let Some(Value::String(pattern)) = obj.get("pattern") {
        children.push(handle(Instruction::Pattern(regex_at(&pointer, pattern)?)));
    }

    // dependentSchemas / dependentRequired
    if let Some(Value::Object(deps)) = obj.get("dependentSchemas") {
        let mut compiled = Vec::new();
        for name in deps.keys() {
            let child = compile_child(
                ctx,
                &doc,
                &base,
                &scopes,
                &pointer.push("dependentSchemas").push(name.as_str()),
            )?;
            compiled.push((name.clone(), child));
        }
        children.push(handle(Instruction::DependentSchemas(compiled)));
    }
    if let Some(Value::Object(deps)) = obj.get("dependentRequired") {
        let mut compiled = Vec::new();
        for (name, required) in deps {
            if let Value::Array(names) = required {
                let names = names
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                compiled.push((name.clone(), names));
            }
        }
        children.push(handle(Instruction::DependentRequired(compiled)));
    }

    // $ref (plain — $dynamicRef is handled after)
    if let Some(Value::String(reference)) = obj.get("$ref") {
        let target_location =
            resolver::resolve_reference(&mut ctx.index, ctx.retriever, &base, reference, &pointer)?;
        let target_doc = target_location.doc.clone();
        let target = compile_node(ctx, target_location, target_doc, scopes.clone())?;
        children.push(handle(Instruction::Ref(target)));
    }

    // $dynamicRef
    if let Some(Value::String(reference)) = obj.get("$dynamicRef") {
        let mut innermost_first = scopes.clone();
        innermost_first.reverse();

        // Unlike `$ref` above, nothing else walks to a `$dynamicAnchor`
        // target — it may sit under a keyword (e.g. `$defs`) compile_node
        // never visits. Compile every location the scope search at
        // validation time could land on now, so `ctx.memo` always has it
        // by the time `DynamicRef::eval` looks it up.
        for scope in &innermost_first {
            if let Some(location) = resolver::resolve_dynamic(&ctx.index, scope, reference) {
                let target_doc = location.doc.clone();
                compile_node(ctx, location, target_doc, scopes.clone())?;
            }
        }
        if let Some(base_scope) = innermost_first.first() {
            let fallback = base_scope.resolve(reference);
            if let Some(location) = ctx.index.lookup_plain(&fallback).cloned() {
                let target_doc = location.doc.clone();
                compile_node(ctx, location, target_doc, scopes.clone())?;
            }
        }

        children.push(handle(Instruction::DynamicRef(DynamicRefSpec {
            reference: reference.clone(),
            scopes: innermost_first,
        })));
    }

    // unevaluated — always last
    if obj.contains_key("unevaluatedProperties") || obj.contains_key("unevaluatedItems") {
        let properties = obj
            .contains_key("unevaluatedProperties")
            .then(|| compile_child(ctx, &doc, &base, &scopes, &pointer.push("unevaluatedProperties")))
            .transpose()?;
        let items = obj
            .contains_key("unevaluatedItems")
            .then(|| compile_child(ctx, &doc, &base, &scopes, &pointer.push("unevaluatedItems")))
            .transpose()?;
        children.push(handle(Instruction::Unevaluated { properties, items }));
    }

    *placeholder.write().unwrap() = Instruction::Sequence(children);
    Ok(placeholder)
}

/// Compile the child schema embedded at `child_pointer` within `doc`
/// (properties, combinators, if/then/else, ...) — looked up by pointer
/// rather than threading the `Value` around, so it shares the memo table
/// uniformly with `$ref` targets.
fn compile_child(
    ctx: &mut CompileContext,
    doc: &Uri,
    base: &Uri,
    scopes: &[Uri],
    child_pointer: &Pointer,
) -> CompileResult<InstructionHandle> {
    let location = Location {
        doc: doc.clone(),
        pointer: child_pointer.clone(),
    };
    compile_node(ctx, location, base.clone(), scopes.to_vec())
}

fn compile_each(
    ctx: &mut CompileContext,
    count: usize,
    doc: &Uri,
    base: &Uri,
    scopes: &[Uri],
    pointer: &Pointer,
    keyword: &str,
) -> CompileResult<Vec<InstructionHandle>> {
    (0..count)
        .map(|i| compile_child(ctx, doc, base, scopes, &pointer.push(keyword).push(i)))
        .collect()
}

fn has_object_keywords(obj: &serde_json::Map<String, Value>) -> bool {
    [
        "properties",
        "patternProperties",
        "additionalProperties",
        "propertyNames",
        "minProperties",
        "maxProperties",
    ]
    .iter()
    .any(|k| obj.contains_key(*k))
}

fn compile_object_checks(
    ctx: &mut CompileContext,
    obj: &serde_json::Map<String, Value>,
    doc: &Uri,
    base: &Uri,
    scopes: &[Uri],
    pointer: &Pointer,
) -> CompileResult<Instruction> {
    let mut properties = Vec::new();
    if let Some(Value::Object(props)) = obj.get("properties") {
        for name in props.keys() {
            let child = compile_child(ctx, doc, base, scopes, &pointer.push("properties").push(name.as_str()))?;
            properties.push((name.clone(), child));
        }
    }

    let mut pattern_properties = Vec::new();
    if let Some(Value::Object(props)) = obj.get("patternProperties") {
        for pattern in props.keys() {
            let re = regex_at(pointer, pattern)?;
            let child = compile_child(
                ctx,
                doc,
                base,
                scopes,
                &pointer.push("patternProperties").push(pattern.as_str()),
            )?;
            pattern_properties.push((re, child));
        }
    }

    let additional_properties = obj
        .contains_key("additionalProperties")
        .then(|| compile_child(ctx, doc, base, scopes, &pointer.push("additionalProperties")))
        .transpose()?;
    let property_names = obj
        .contains_key("propertyNames")
        .then(|| compile_child(ctx, doc, base, scopes, &pointer.push("propertyNames")))
        .transpose()?;

    Ok(Instruction::CheckObject {
        properties,
        pattern_properties,
        additional_properties,
        property_names,
        min_properties: obj.get("minProperties").and_then(as_usize),
        max_properties: obj.get("maxProperties").and_then(as_usize),
    })
}

fn has_array_keywords(obj: &serde_json::Map<String, Value>) -> bool {
    [
        "prefixItems",
        "items",
        "additionalItems",
        "contains",
        "uniqueItems",
        "minItems",
        "maxItems",
    ]
    .iter()
    .any(|k| obj.contains_key(*k))
}

fn compile_array_checks(
    ctx: &mut CompileContext,
    obj: &serde_json::Map<String, Value>,
    doc: &Uri,
    base: &Uri,
    scopes: &[Uri],
    pointer: &Pointer,
) -> CompileResult<Instruction> {
    let mut prefix_items = Vec::new();
    if let Some(Value::Array(subs)) = obj.get("prefixItems") {
        for i in 0..subs.len() {
            prefix_items.push(compile_child(ctx, doc, base, scopes, &pointer.push("prefixItems").push(i))?);
        }
    }

    let items = obj
        .contains_key("items")
        .then(|| compile_child(ctx, doc, base, scopes, &pointer.push("items")))
        .transpose()?;
    let additional_items = obj
        .contains_key("additionalItems")
        .then(|| compile_child(ctx, doc, base, scopes, &pointer.push("additionalItems")))
        .transpose()?;

    let contains = if obj.contains_key("contains") {
        let schema = compile_child(ctx, doc, base, scopes, &pointer.push("contains"))?;
        let min = obj.get("minContains").and_then(as_usize).unwrap_or(1);
        let max = obj.get("maxContains").and_then(as_usize);
        Some(ContainsSpec { schema, min, max })
    } else {
        None
    };

    Ok(Instruction::CheckArray {
        prefix_items,
        items,
        additional_items,
        contains,
        unique_items: obj.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false),
        min_items: obj.get("minItems").and_then(as_usize),
        max_items: obj.get("maxItems").and_then(as_usize),
    })
}

fn compile_type(value: &Value) -> crate::primitive_type::PrimitiveTypesBitMap {
    let mut set = crate::primitive_type::PrimitiveTypesBitMap::new();
    match value {
        Value::String(name) => {
            if let Some(kind) = crate::primitive_type::PrimitiveType::try_from_str(name) {
                set.add_type(kind);
            }
        }
        Value::Array(names) => {
            for name in names {
                if let Some(name) = name.as_str() {
                    if let Some(kind) = crate::primitive_type::PrimitiveType::try_from_str(name) {
                        set.add_type(kind);
                    }
                }
            }
        }
        _ => {}
    }
    set
}
