//! Instruction model: the value objects produced by the parser and consumed by the engine.
//!
//! Built once at load time and immutable afterward (see `StateGraph`'s similarly immutable
//! `CompiledStateGraph` for the analogous "build once, run many times" split in the graph
//! engine this crate grew out of).

use serde_json::Value;

/// A literal value parsed from DSL text. Aliased to the same open value domain values flow
/// through at runtime: `{scalar | array | object | null}`.
pub type Literal = Value;

/// One segment of a [`NodeRef`] path. A pure-digit segment denotes an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Name(String),
    Index(usize),
}

impl PathSegment {
    pub fn name(s: impl Into<String>) -> Self {
        PathSegment::Name(s.into())
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Name(n) => write!(f, "{n}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Source namespace of a [`NodeRef`]: either the bridge's own module (`Self`) or a named
/// external module imported via `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleRef {
    /// The distinguished "self" module: the bridge or tool body the NodeRef was written in.
    SelfModule,
    Named(String),
}

/// Structured address of a data point in the dataflow graph.
///
/// See spec §3. `instance` is only meaningful for tool nodes (`type == "tool"`); it is
/// assigned by the parser in declaration order starting at 1, per `(module, field)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub module: ModuleRef,
    pub r#type: String,
    pub field: String,
    pub instance: Option<u32>,
    /// `Some(alias)` when this ref reads the current element of the array-mapping block bound
    /// to `alias` — e.g. `p.streetAddress` inside `... [] as p { ... }` carries `Some("p")`. The
    /// alias is what lets the shadow chain (`engine::Shadow::resolve`) walk past an inner
    /// mapping block to find an outer one's element when blocks nest.
    pub element: Option<String>,
    pub path: Vec<PathSegment>,
}

/// Reserved `type` tag used for NodeRefs addressing tool invocations.
pub const TOOL_TYPE: &str = "tool";
/// Reserved `type`/`field` tags used for the bridge's own input/output/context/const trunks.
pub const TRUNK_INPUT: &str = "input";
pub const TRUNK_OUTPUT: &str = "output";
pub const TRUNK_CONTEXT: &str = "context";
pub const TRUNK_CONST: &str = "const";
/// Sentinel field used for NodeRefs that address the current array element inside a mapping
/// block (see `element` flag); `field` is unused in that case but kept non-empty for Debug.
pub const ELEMENT_FIELD: &str = "$element";

impl NodeRef {
    pub fn trunk(kind: &str, path: Vec<PathSegment>) -> Self {
        NodeRef {
            module: ModuleRef::SelfModule,
            r#type: kind.to_string(),
            field: kind.to_string(),
            instance: None,
            element: None,
            path,
        }
    }

    pub fn tool(field: impl Into<String>, instance: u32, path: Vec<PathSegment>) -> Self {
        NodeRef {
            module: ModuleRef::SelfModule,
            r#type: TOOL_TYPE.to_string(),
            field: field.into(),
            instance: Some(instance),
            element: None,
            path,
        }
    }

    pub fn tool_in(module: ModuleRef, field: impl Into<String>, instance: u32, path: Vec<PathSegment>) -> Self {
        NodeRef { module, r#type: TOOL_TYPE.to_string(), field: field.into(), instance: Some(instance), element: None, path }
    }

    pub const DEFINE_TYPE: &'static str = "define";

    pub fn define(field: impl Into<String>, instance: u32, path: Vec<PathSegment>) -> Self {
        NodeRef {
            module: ModuleRef::SelfModule,
            r#type: Self::DEFINE_TYPE.to_string(),
            field: field.into(),
            instance: Some(instance),
            element: None,
            path,
        }
    }

    /// Builds a ref to the current element of the array-mapping block bound to `alias`.
    pub fn element(alias: impl Into<String>, path: Vec<PathSegment>) -> Self {
        NodeRef {
            module: ModuleRef::SelfModule,
            r#type: ELEMENT_FIELD.to_string(),
            field: ELEMENT_FIELD.to_string(),
            instance: None,
            element: Some(alias.into()),
            path,
        }
    }

    /// Memoization key for the execution tree's per-instance promise table. Only valid for
    /// tool NodeRefs (`instance.is_some()`).
    pub fn memo_key(&self) -> Option<(String, u32)> {
        self.instance.map(|i| (self.field.clone(), i))
    }
}

/// A substitution applied on the value a pull wire resolved to (or failed to resolve).
/// Chain order is preserved; each operator inspects the value produced by the previous step.
#[derive(Debug, Clone)]
pub enum FallbackOp {
    /// `|| lit`: substitutes `lit` only when the current value is `null`/missing.
    NullCoalesce(Literal),
    /// `?? expr`: substitutes by evaluating `expr` only when the current step raised an error.
    ErrorRecover(FallbackExpr),
}

#[derive(Debug, Clone)]
pub enum FallbackExpr {
    Literal(Literal),
    Ref(Box<SourceExpr>),
}

/// The right-hand side of a pull wire: either a plain NodeRef, or a right-to-left pipe chain
/// of tool forks applied to a base NodeRef.
#[derive(Debug, Clone)]
pub enum SourceExpr {
    Ref(NodeRef),
    Pipe {
        /// Outermost hop first (syntactic left-to-right order as written: `a:b:source`
        /// is `hops = [a, b]`, `base = source`).
        hops: Vec<PipeHop>,
        base: Box<SourceExpr>,
    },
}

/// One hop of a pipe chain: `handle` is the tool name invoked at this position, `instance` the
/// fresh per-site fork instance assigned by the parser. A hop is evaluated by dispatching the
/// named tool directly against the previous hop's (or the base expression's) resolved value —
/// it does not go through that tool's own wire-based argument construction (see DESIGN.md,
/// "pipe semantics").
#[derive(Debug, Clone)]
pub struct PipeHop {
    pub handle: String,
    pub instance: u32,
}

/// A directed edge in the dataflow graph.
#[derive(Debug, Clone)]
pub enum Wire {
    Constant {
        value: Literal,
        to: NodeRef,
    },
    Pull {
        from: SourceExpr,
        to: NodeRef,
        force: bool,
        fallbacks: Vec<FallbackOp>,
    },
}

impl Wire {
    pub fn to(&self) -> &NodeRef {
        match self {
            Wire::Constant { to, .. } => to,
            Wire::Pull { to, .. } => to,
        }
    }

    pub fn to_mut(&mut self) -> &mut NodeRef {
        match self {
            Wire::Constant { to, .. } => to,
            Wire::Pull { to, .. } => to,
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, Wire::Pull { force: true, .. })
    }

    /// Dotted-path key used for target-path override during tool inheritance merge (§4.3)
    /// and for duplicate-target detection within one effective wire set.
    pub fn target_key(&self) -> String {
        self.to()
            .path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// What a local alias is bound to within a bridge, tool, or define body.
#[derive(Debug, Clone)]
pub enum HandleSource {
    Tool { name: String, instance: u32, module: ModuleRef },
    Define { name: String, instance: u32 },
    /// An alias bound directly to one of the reserved trunks (`input`/`output`/`context`/
    /// `const`), e.g. `with input as h`. Holds the trunk's reserved name.
    Trunk(&'static str),
    /// Iterator alias bound inside an array-mapping block, addressing the current element.
    Element,
}

pub const RESERVED_TRUNKS: &[&str] = &[TRUNK_INPUT, TRUNK_OUTPUT, TRUNK_CONTEXT, TRUNK_CONST];

#[derive(Debug, Clone)]
pub struct HandleBinding {
    pub alias: String,
    pub source: HandleSource,
}

/// A `target <- source[] as alias { ... }` block: `body` is its own complete `Body`, parsed and
/// kept as its own subtree rather than flattened into the enclosing body's wires, so a mapping
/// nested inside another mapping's block resolves against its own handles and can itself hold
/// further `array_mappings` (spec §4.4 "shadow scope chain").
#[derive(Debug, Clone)]
pub struct ArrayMapping {
    /// Dotted target path of the wire in the enclosing body that supplies the source array
    /// (matches that wire's `target_key()`).
    pub target_key: String,
    pub alias: String,
    pub body: Box<Body>,
}

/// Shared body grammar used by `Bridge`, `ToolDef`, and `DefineDef`: handle declarations plus
/// the wires that consume them. See spec invariant I1: every NodeRef inside a body resolves to
/// exactly one declared handle (or the body's own input/output trunk).
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub handles: Vec<HandleBinding>,
    pub wires: Vec<Wire>,
    pub array_mappings: Vec<ArrayMapping>,
    /// Handle names that appear in pipe-fork position somewhere in this body, in the order
    /// first seen; used by the serializer to reconstruct `a:b:source` chains.
    pub pipe_handles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Bridge {
    pub r#type: String,
    pub field: String,
    pub body: Body,
    /// `true` when the entire body is a single `with <tool>` line and nothing else: the
    /// tool's output becomes the field's value verbatim.
    pub passthrough: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: String,
    /// Name of a natively registered callable this tool dispatches to directly, bypassing
    /// its own wire set (used for `std.*` and other Rust-registered tools declared in text).
    pub r#fn: Option<String>,
    pub extends: Option<String>,
    pub body: Body,
}

#[derive(Debug, Clone)]
pub struct ConstDef {
    pub name: String,
    pub value: Literal,
}

#[derive(Debug, Clone)]
pub struct DefineDef {
    pub name: String,
    pub body: Body,
}

/// Closed sum of top-level instructions the parser produces.
#[derive(Debug, Clone)]
pub enum Instruction {
    Bridge(Bridge),
    Tool(ToolDef),
    Const(ConstDef),
    Define(DefineDef),
}

impl Instruction {
    pub fn as_bridge(&self) -> Option<&Bridge> {
        match self {
            Instruction::Bridge(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&ToolDef> {
        match self {
            Instruction::Tool(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&ConstDef> {
        match self {
            Instruction::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_define(&self) -> Option<&DefineDef> {
        match self {
            Instruction::Define(d) => Some(d),
            _ => None,
        }
    }
}
