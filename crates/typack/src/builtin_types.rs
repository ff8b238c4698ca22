//! Built-in and utility type detection
//!
//! This module provides a single source of truth for determining whether a
//! referenced type name is a TypeScript primitive, a global built-in, or a
//! well-known utility type. These names are leaves of the dependency walk:
//! they are never looked up in any file and never recursed into.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Primitive keywords and literal types that can appear in a type position
static PRIMITIVES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "any", "bigint", "boolean", "false", "never", "null", "number", "object", "string",
        "symbol", "this", "true", "undefined", "unknown", "void",
    ]
    .into_iter()
    .collect()
});

/// Global built-in object types available without any import
static GLOBAL_BUILTINS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "Array",
        "ArrayBuffer",
        "AsyncIterable",
        "AsyncIterator",
        "Boolean",
        "DataView",
        "Date",
        "Error",
        "Function",
        "Generator",
        "Iterable",
        "IterableIterator",
        "Iterator",
        "Map",
        "Number",
        "Object",
        "Promise",
        "PromiseLike",
        "ReadonlyArray",
        "ReadonlyMap",
        "ReadonlySet",
        "RegExp",
        "Set",
        "String",
        "Symbol",
        "Uint8Array",
        "WeakMap",
        "WeakRef",
        "WeakSet",
    ]
    .into_iter()
    .collect()
});

/// Compiler-provided utility types
static UTILITY_TYPES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "Awaited",
        "Capitalize",
        "ConstructorParameters",
        "Exclude",
        "Extract",
        "InstanceType",
        "Lowercase",
        "NoInfer",
        "NonNullable",
        "Omit",
        "OmitThisParameter",
        "Parameters",
        "Partial",
        "Pick",
        "Readonly",
        "Record",
        "Required",
        "ReturnType",
        "ThisParameterType",
        "ThisType",
        "Uncapitalize",
        "Uppercase",
    ]
    .into_iter()
    .collect()
});

/// Check if a referenced name is a basic or utility type
///
/// Basic and utility types terminate recursion during the dependency walk:
/// their bodies live in the compiler's lib files, not in any project module,
/// so there is nothing to collect for them.
pub fn is_basic_or_utility_type(name: &str) -> bool {
    PRIMITIVES.contains(name) || GLOBAL_BUILTINS.contains(name) || UTILITY_TYPES.contains(name)
}
