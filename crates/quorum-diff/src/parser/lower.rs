//! Lowering from the tree-sitter concrete tree to [`Node`]
//!
//! The lowering reproduces the shape Python's own `ast` module gives a
//! program:
//! - comments and layout vanish
//! - docstrings stay as `Expr(Constant)`
//! - `elif` nests an `If` inside the enclosing `orelse`
//! - chained assignment is one `Assign` with several targets
//! - same-operator `and`/`or` chains flatten into one `BoolOp`
//! - f-strings become `JoinedStr` over `Constant`/`FormattedValue`
//!
//! Children are emitted in source order. Nesting is capped at
//! [`MAX_NESTING_DEPTH`] so hostile input fails instead of exhausting the
//! stack.

use super::MAX_NESTING_DEPTH;
use crate::ast::{ExprContext, Node, NodeKind, Operator};
use crate::error::ParseError;
use std::cell::Cell;
use tree_sitter::Node as CstNode;

type Lowered = Result<Node, ParseError>;
type LoweredMany = Result<Vec<Node>, ParseError>;

/// Named, non-extra children
fn named(node: CstNode<'_>) -> Vec<CstNode<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    children
}

/// All non-extra children, anonymous tokens included
fn tokens(node: CstNode<'_>) -> Vec<CstNode<'_>> {
    let mut cursor = node.walk();
    let children = node
        .children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    children
}

fn fields<'t>(node: CstNode<'t>, name: &str) -> Vec<CstNode<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(name, &mut cursor).collect();
    children
}

fn required<'t>(node: CstNode<'t>, name: &str) -> Result<CstNode<'t>, ParseError> {
    node.child_by_field_name(name)
        .ok_or_else(|| ParseError::unsupported(&node))
}

fn first_named(node: CstNode<'_>) -> Result<CstNode<'_>, ParseError> {
    named(node)
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::unsupported(&node))
}

/// True when `node` has an anonymous child token of `kind`
fn has_token(node: CstNode<'_>, kind: &str) -> bool {
    tokens(node)
        .iter()
        .any(|child| !child.is_named() && child.kind() == kind)
}

fn ctx(context: ExprContext) -> Node {
    Node::leaf(NodeKind::Context(context))
}

fn op(operator: Operator) -> Node {
    Node::leaf(NodeKind::Op(operator))
}

/// `List`/`Tuple` with trailing context
fn sequence(kind: NodeKind, mut elements: Vec<Node>, context: ExprContext) -> Node {
    elements.push(ctx(context));
    Node::new(kind, elements)
}

fn flush_literal(children: &mut Vec<Node>, pending: &mut bool) {
    if *pending {
        children.push(Node::leaf(NodeKind::Constant));
        *pending = false;
    }
}

/// Walks one concrete tree and builds the abstract one
pub(super) struct Lowerer<'src> {
    source: &'src [u8],
    depth: Cell<usize>,
}

impl<'src> Lowerer<'src> {
    pub(super) fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            depth: Cell::new(0),
        }
    }

    /// Run `lower` one level deeper, failing past [`MAX_NESTING_DEPTH`]
    fn nested<T>(
        &self,
        node: CstNode<'_>,
        lower: impl FnOnce() -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let depth = self.depth.get() + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(ParseError::too_deep(&node, MAX_NESTING_DEPTH));
        }
        self.depth.set(depth);
        let lowered = lower();
        self.depth.set(depth - 1);
        lowered
    }

    /// Lower the root `module` node
    pub(super) fn module(&self, root: CstNode<'_>) -> Lowered {
        Ok(Node::new(NodeKind::Module, self.statements(root)?))
    }

    fn text(&self, node: CstNode<'_>) -> Result<&'src str, ParseError> {
        node.utf8_text(self.source)
            .map_err(|_| ParseError::syntax_at(node.start_position(), "invalid utf-8"))
    }

    fn name(&self, node: CstNode<'_>, context: ExprContext) -> Lowered {
        Ok(Node::new(
            NodeKind::Name {
                id: self.text(node)?.to_string(),
            },
            vec![ctx(context)],
        ))
    }

    fn statements(&self, parent: CstNode<'_>) -> LoweredMany {
        named(parent)
            .into_iter()
            .map(|child| self.statement(child))
            .collect()
    }

    /// Statements of the block held in field `name`
    fn suite(&self, node: CstNode<'_>, name: &str) -> LoweredMany {
        self.statements(required(node, name)?)
    }

    fn expressions(&self, nodes: &[CstNode<'_>], context: ExprContext) -> LoweredMany {
        nodes.iter().map(|n| self.expr(*n, context)).collect()
    }

    /// One expression, or a `Tuple` when several share a slot
    fn expr_or_tuple(&self, nodes: &[CstNode<'_>], context: ExprContext) -> Lowered {
        match nodes {
            [single] => self.expr(*single, context),
            many => Ok(sequence(
                NodeKind::Tuple,
                self.expressions(many, context)?,
                context,
            )),
        }
    }

    // ---- statements --------------------------------------------------

    fn statement(&self, node: CstNode<'_>) -> Lowered {
        self.nested(node, || self.statement_node(node))
    }

    fn statement_node(&self, node: CstNode<'_>) -> Lowered {
        use ExprContext::Load;

        match node.kind() {
            "expression_statement" => self.expression_statement(node),
            "return_statement" => Ok(Node::new(
                NodeKind::Return,
                self.expressions(&named(node), Load)?,
            )),
            "pass_statement" => Ok(Node::leaf(NodeKind::Pass)),
            "break_statement" => Ok(Node::leaf(NodeKind::Break)),
            "continue_statement" => Ok(Node::leaf(NodeKind::Continue)),
            "delete_statement" => self.delete(node),
            "raise_statement" => Ok(Node::new(
                NodeKind::Raise,
                self.expressions(&named(node), Load)?,
            )),
            "assert_statement" => Ok(Node::new(
                NodeKind::Assert,
                self.expressions(&named(node), Load)?,
            )),
            "global_statement" => Ok(Node::leaf(NodeKind::Global)),
            "nonlocal_statement" => Ok(Node::leaf(NodeKind::Nonlocal)),
            "import_statement" => self.import(node),
            "import_from_statement" | "future_import_statement" => self.import_from(node),
            "if_statement" => self.if_statement(node),
            "for_statement" => self.for_statement(node),
            "while_statement" => self.while_statement(node),
            "try_statement" => self.try_statement(node),
            "with_statement" => self.with_statement(node),
            "function_definition" => self.function(node, Vec::new()),
            "class_definition" => self.class(node, Vec::new()),
            "decorated_definition" => self.decorated(node),
            "match_statement" => self.match_statement(node),
            "type_alias_statement" => self.type_alias(node),
            "print_statement" | "exec_statement" => Err(ParseError::legacy(
                &node,
                node.kind().trim_end_matches("_statement"),
            )),
            _ => Err(ParseError::unsupported(&node)),
        }
    }

    fn expression_statement(&self, node: CstNode<'_>) -> Lowered {
        let children = named(node);
        match children.as_slice() {
            [] => Err(ParseError::unsupported(&node)),
            [single] if single.kind() == "assignment" => self.assignment(*single),
            [single] if single.kind() == "augmented_assignment" => {
                self.augmented_assignment(*single)
            }
            many => Ok(Node::new(
                NodeKind::Expr,
                vec![self.expr_or_tuple(many, ExprContext::Load)?],
            )),
        }
    }

    fn assignment(&self, node: CstNode<'_>) -> Lowered {
        let left = required(node, "left")?;

        if let Some(annotation) = node.child_by_field_name("type") {
            let mut children = vec![
                self.expr(left, ExprContext::Store)?,
                self.expr(annotation, ExprContext::Load)?,
            ];
            if let Some(value) = node.child_by_field_name("right") {
                children.push(self.expr(value, ExprContext::Load)?);
            }
            return Ok(Node::new(NodeKind::AnnAssign, children));
        }

        let mut children = vec![self.expr(left, ExprContext::Store)?];
        let mut right = required(node, "right")?;
        while right.kind() == "assignment" && right.child_by_field_name("type").is_none() {
            children.push(self.expr(required(right, "left")?, ExprContext::Store)?);
            right = required(right, "right")?;
        }
        children.push(self.expr(right, ExprContext::Load)?);

        Ok(Node::new(NodeKind::Assign, children))
    }

    fn augmented_assignment(&self, node: CstNode<'_>) -> Lowered {
        let operator = required(node, "operator")?;
        let operator = Operator::binary(operator.kind())
            .ok_or_else(|| ParseError::unsupported(&operator))?;

        Ok(Node::new(
            NodeKind::AugAssign,
            vec![
                self.expr(required(node, "left")?, ExprContext::Store)?,
                op(operator),
                self.expr(required(node, "right")?, ExprContext::Load)?,
            ],
        ))
    }

    fn delete(&self, node: CstNode<'_>) -> Lowered {
        let mut targets = Vec::new();
        for child in named(node) {
            if child.kind() == "expression_list" {
                targets.extend(self.expressions(&named(child), ExprContext::Del)?);
            } else {
                targets.push(self.expr(child, ExprContext::Del)?);
            }
        }
        Ok(Node::new(NodeKind::Delete, targets))
    }

    fn alias(&self, node: CstNode<'_>) -> Lowered {
        let name = if node.kind() == "aliased_import" {
            required(node, "name")?
        } else {
            node
        };
        Ok(Node::leaf(NodeKind::Alias {
            name: self.text(name)?.to_string(),
        }))
    }

    fn import(&self, node: CstNode<'_>) -> Lowered {
        let aliases = fields(node, "name")
            .into_iter()
            .map(|name| self.alias(name))
            .collect::<LoweredMany>()?;
        Ok(Node::new(NodeKind::Import, aliases))
    }

    fn import_from(&self, node: CstNode<'_>) -> Lowered {
        let mut aliases = fields(node, "name")
            .into_iter()
            .map(|name| self.alias(name))
            .collect::<LoweredMany>()?;

        if named(node).iter().any(|c| c.kind() == "wildcard_import") {
            aliases.push(Node::leaf(NodeKind::Alias {
                name: "*".to_string(),
            }));
        }
        Ok(Node::new(NodeKind::ImportFrom, aliases))
    }

    fn if_statement(&self, node: CstNode<'_>) -> Lowered {
        // Build the orelse chain from the last clause backwards
        let mut orelse = Vec::new();
        for alternative in fields(node, "alternative").into_iter().rev() {
            match alternative.kind() {
                "else_clause" => orelse = self.suite(alternative, "body")?,
                "elif_clause" => {
                    let mut children =
                        vec![self.expr(required(alternative, "condition")?, ExprContext::Load)?];
                    children.extend(self.suite(alternative, "consequence")?);
                    children.append(&mut orelse);
                    orelse = vec![Node::new(NodeKind::If, children)];
                }
                _ => return Err(ParseError::unsupported(&alternative)),
            }
        }

        let mut children = vec![self.expr(required(node, "condition")?, ExprContext::Load)?];
        children.extend(self.suite(node, "consequence")?);
        children.extend(orelse);
        Ok(Node::new(NodeKind::If, children))
    }

    fn else_suite(&self, node: CstNode<'_>) -> LoweredMany {
        match node.child_by_field_name("alternative") {
            Some(alternative) => self.suite(alternative, "body"),
            None => Ok(Vec::new()),
        }
    }

    fn for_statement(&self, node: CstNode<'_>) -> Lowered {
        let kind = if has_token(node, "async") {
            NodeKind::AsyncFor
        } else {
            NodeKind::For
        };

        let mut children = vec![
            self.expr(required(node, "left")?, ExprContext::Store)?,
            self.expr(required(node, "right")?, ExprContext::Load)?,
        ];
        children.extend(self.suite(node, "body")?);
        children.extend(self.else_suite(node)?);
        Ok(Node::new(kind, children))
    }

    fn while_statement(&self, node: CstNode<'_>) -> Lowered {
        let mut children = vec![self.expr(required(node, "condition")?, ExprContext::Load)?];
        children.extend(self.suite(node, "body")?);
        children.extend(self.else_suite(node)?);
        Ok(Node::new(NodeKind::While, children))
    }

    fn try_statement(&self, node: CstNode<'_>) -> Lowered {
        let mut children = self.suite(node, "body")?;
        let mut star = false;

        for clause in named(node) {
            match clause.kind() {
                "block" => {}
                "except_clause" => children.push(self.except_handler(clause)?),
                "except_group_clause" => {
                    star = true;
                    children.push(self.except_handler(clause)?);
                }
                "else_clause" => children.extend(self.suite(clause, "body")?),
                "finally_clause" => {
                    for block in named(clause) {
                        children.extend(self.statements(block)?);
                    }
                }
                _ => return Err(ParseError::unsupported(&clause)),
            }
        }

        let kind = if star { NodeKind::TryStar } else { NodeKind::Try };
        Ok(Node::new(kind, children))
    }

    /// Split an `as_pattern` into its value and bound target
    fn as_pattern_parts<'t>(
        &self,
        node: CstNode<'t>,
    ) -> Result<(CstNode<'t>, CstNode<'t>), ParseError> {
        match named(node).as_slice() {
            [value, target] => {
                let target = if target.kind() == "as_pattern_target" {
                    first_named(*target)?
                } else {
                    *target
                };
                Ok((*value, target))
            }
            _ => Err(ParseError::unsupported(&node)),
        }
    }

    fn except_handler(&self, node: CstNode<'_>) -> Lowered {
        let (parts, blocks): (Vec<_>, Vec<_>) =
            named(node).into_iter().partition(|c| c.kind() != "block");

        let mut children = Vec::new();
        let mut name = None;
        match parts.as_slice() {
            [] => {}
            [single] if single.kind() == "as_pattern" => {
                let (value, alias) = self.as_pattern_parts(*single)?;
                children.push(self.expr(value, ExprContext::Load)?);
                name = Some(self.text(alias)?.to_string());
            }
            [single] => children.push(self.expr(*single, ExprContext::Load)?),
            [value, alias] => {
                children.push(self.expr(*value, ExprContext::Load)?);
                name = Some(self.text(*alias)?.to_string());
            }
            _ => return Err(ParseError::unsupported(&node)),
        }

        for block in blocks {
            children.extend(self.statements(block)?);
        }
        Ok(Node::new(NodeKind::ExceptHandler { name }, children))
    }

    fn with_statement(&self, node: CstNode<'_>) -> Lowered {
        let kind = if has_token(node, "async") {
            NodeKind::AsyncWith
        } else {
            NodeKind::With
        };

        let mut children = Vec::new();
        for clause in named(node) {
            if clause.kind() == "with_clause" {
                for item in named(clause) {
                    children.push(self.with_item(item)?);
                }
            }
        }
        children.extend(self.suite(node, "body")?);
        Ok(Node::new(kind, children))
    }

    fn with_item(&self, node: CstNode<'_>) -> Lowered {
        let value = required(node, "value")?;
        let children = if value.kind() == "as_pattern" {
            let (context_expr, target) = self.as_pattern_parts(value)?;
            vec![
                self.expr(context_expr, ExprContext::Load)?,
                self.expr(target, ExprContext::Store)?,
            ]
        } else {
            vec![self.expr(value, ExprContext::Load)?]
        };
        Ok(Node::new(NodeKind::WithItem, children))
    }

    fn function(&self, node: CstNode<'_>, decorators: Vec<Node>) -> Lowered {
        let name = self.text(required(node, "name")?)?.to_string();
        let kind = if has_token(node, "async") {
            NodeKind::AsyncFunctionDef { name }
        } else {
            NodeKind::FunctionDef { name }
        };

        let mut children = decorators;
        children.extend(self.type_params(node)?);
        children.push(self.arguments(node.child_by_field_name("parameters"))?);
        if let Some(returns) = node.child_by_field_name("return_type") {
            children.push(self.expr(returns, ExprContext::Load)?);
        }
        children.extend(self.suite(node, "body")?);
        Ok(Node::new(kind, children))
    }

    fn class(&self, node: CstNode<'_>, decorators: Vec<Node>) -> Lowered {
        let name = self.text(required(node, "name")?)?.to_string();

        let mut children = decorators;
        children.extend(self.type_params(node)?);
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            children.extend(self.call_arguments(superclasses)?);
        }
        children.extend(self.suite(node, "body")?);
        Ok(Node::new(NodeKind::ClassDef { name }, children))
    }

    fn decorated(&self, node: CstNode<'_>) -> Lowered {
        let mut decorators = Vec::new();
        for child in named(node) {
            if child.kind() == "decorator" {
                decorators.push(self.expr(first_named(child)?, ExprContext::Load)?);
            }
        }

        let definition = required(node, "definition")?;
        match definition.kind() {
            "function_definition" => self.function(definition, decorators),
            "class_definition" => self.class(definition, decorators),
            _ => Err(ParseError::unsupported(&definition)),
        }
    }

    /// `TypeVar`, `ParamSpec` and `TypeVarTuple` nodes of a `[...]` list
    fn type_params(&self, node: CstNode<'_>) -> LoweredMany {
        match node.child_by_field_name("type_parameters") {
            Some(list) => self.type_param_list(list),
            None => Ok(Vec::new()),
        }
    }

    fn type_param_list(&self, list: CstNode<'_>) -> LoweredMany {
        named(list)
            .into_iter()
            .map(|param| self.type_param(param))
            .collect()
    }

    fn type_param(&self, node: CstNode<'_>) -> Lowered {
        let param = if node.kind() == "type" {
            first_named(node)?
        } else {
            node
        };

        match param.kind() {
            "identifier" => Ok(Node::leaf(NodeKind::TypeVar)),
            "constrained_type" => match named(param).as_slice() {
                [_, bound] => Ok(Node::new(
                    NodeKind::TypeVar,
                    vec![self.expr(*bound, ExprContext::Load)?],
                )),
                _ => Err(ParseError::unsupported(&param)),
            },
            "splat_type" if has_token(param, "**") => Ok(Node::leaf(NodeKind::ParamSpec)),
            "splat_type" => Ok(Node::leaf(NodeKind::TypeVarTuple)),
            _ => Err(ParseError::unsupported(&param)),
        }
    }

    /// `type Name[params] = value`
    fn type_alias(&self, node: CstNode<'_>) -> Lowered {
        let left = required(node, "left")?;
        let left = if left.kind() == "type" {
            first_named(left)?
        } else {
            left
        };

        let mut children = Vec::new();
        match left.kind() {
            "generic_type" => {
                children.push(self.expr(first_named(left)?, ExprContext::Store)?);
                for list in named(left) {
                    if list.kind() == "type_parameter" {
                        children.extend(self.type_param_list(list)?);
                    }
                }
            }
            "subscript" => {
                children.push(self.expr(required(left, "value")?, ExprContext::Store)?);
                for param in fields(left, "subscript") {
                    children.push(self.type_param(param)?);
                }
            }
            _ => children.push(self.expr(left, ExprContext::Store)?),
        }
        children.push(self.expr(required(node, "right")?, ExprContext::Load)?);
        Ok(Node::new(NodeKind::TypeAlias, children))
    }

    /// `arguments` node for a def or lambda parameter list
    fn arguments(&self, parameters: Option<CstNode<'_>>) -> Lowered {
        let mut children = Vec::new();
        if let Some(parameters) = parameters {
            for parameter in named(parameters) {
                self.parameter(parameter, &mut children)?;
            }
        }
        Ok(Node::new(NodeKind::Arguments, children))
    }

    fn parameter_name(&self, node: CstNode<'_>) -> Result<String, ParseError> {
        match node.kind() {
            "identifier" => Ok(self.text(node)?.to_string()),
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                Ok(self.text(first_named(node)?)?.to_string())
            }
            _ => Err(ParseError::unsupported(&node)),
        }
    }

    fn parameter(&self, node: CstNode<'_>, out: &mut Vec<Node>) -> Result<(), ParseError> {
        let arg = |name: String, annotation: Vec<Node>| Node::new(NodeKind::Arg { name }, annotation);

        match node.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                out.push(arg(self.parameter_name(node)?, Vec::new()));
            }
            "typed_parameter" => {
                let annotation = self.expr(required(node, "type")?, ExprContext::Load)?;
                out.push(arg(self.parameter_name(first_named(node)?)?, vec![annotation]));
            }
            "default_parameter" => {
                out.push(arg(self.parameter_name(required(node, "name")?)?, Vec::new()));
                out.push(self.expr(required(node, "value")?, ExprContext::Load)?);
            }
            "typed_default_parameter" => {
                let annotation = self.expr(required(node, "type")?, ExprContext::Load)?;
                out.push(arg(self.parameter_name(required(node, "name")?)?, vec![annotation]));
                out.push(self.expr(required(node, "value")?, ExprContext::Load)?);
            }
            "keyword_separator" | "positional_separator" => {}
            _ => return Err(ParseError::unsupported(&node)),
        }
        Ok(())
    }

    // ---- match -------------------------------------------------------

    fn match_statement(&self, node: CstNode<'_>) -> Lowered {
        let subjects = fields(node, "subject");
        let mut children = vec![self.expr_or_tuple(&subjects, ExprContext::Load)?];

        let body = required(node, "body")?;
        for case in named(body) {
            if case.kind() == "case_clause" {
                children.push(self.match_case(case)?);
            }
        }
        Ok(Node::new(NodeKind::Match, children))
    }

    fn match_case(&self, node: CstNode<'_>) -> Lowered {
        let patterns: Vec<_> = named(node)
            .into_iter()
            .filter(|c| c.kind() == "case_pattern")
            .collect();

        let pattern = match patterns.as_slice() {
            [single] => self.pattern(*single)?,
            many => Node::new(
                NodeKind::MatchSequence,
                many.iter()
                    .map(|p| self.pattern(*p))
                    .collect::<LoweredMany>()?,
            ),
        };

        let mut children = vec![pattern];
        if let Some(guard) = node.child_by_field_name("guard") {
            children.push(self.expr(first_named(guard)?, ExprContext::Load)?);
        }
        children.extend(self.suite(node, "consequence")?);
        Ok(Node::new(NodeKind::MatchCase, children))
    }

    /// Dotted name used as a value: `Color.RED`
    fn dotted_value(&self, node: CstNode<'_>) -> Lowered {
        let mut parts = named(node).into_iter();
        let first = parts.next().ok_or_else(|| ParseError::unsupported(&node))?;

        let mut value = self.name(first, ExprContext::Load)?;
        for part in parts {
            value = Node::new(
                NodeKind::Attribute {
                    attr: self.text(part)?.to_string(),
                },
                vec![value, ctx(ExprContext::Load)],
            );
        }
        Ok(value)
    }

    fn patterns(&self, nodes: &[CstNode<'_>]) -> LoweredMany {
        nodes.iter().map(|n| self.pattern(*n)).collect()
    }

    fn pattern(&self, node: CstNode<'_>) -> Lowered {
        self.nested(node, || self.pattern_node(node))
    }

    fn pattern_node(&self, node: CstNode<'_>) -> Lowered {
        match node.kind() {
            "case_pattern" => match named(node).as_slice() {
                [] => Ok(Node::leaf(NodeKind::MatchAs)),
                [inner] => self.pattern(*inner),
                _ => Err(ParseError::unsupported(&node)),
            },
            "as_pattern" => {
                let inner = first_named(node)?;
                Ok(Node::new(NodeKind::MatchAs, vec![self.pattern(inner)?]))
            }
            "identifier" => Ok(Node::leaf(NodeKind::MatchAs)),
            "dotted_name" => {
                if named(node).len() == 1 {
                    Ok(Node::leaf(NodeKind::MatchAs))
                } else {
                    Ok(Node::new(NodeKind::MatchValue, vec![self.dotted_value(node)?]))
                }
            }
            "true" | "false" | "none" => Ok(Node::leaf(NodeKind::MatchSingleton)),
            "complex_pattern" => Ok(Node::new(
                NodeKind::MatchValue,
                vec![Node::leaf(NodeKind::Constant)],
            )),
            "splat_pattern" => Ok(Node::leaf(NodeKind::MatchStar)),
            "list_pattern" | "tuple_pattern" => Ok(Node::new(
                NodeKind::MatchSequence,
                self.patterns(&named(node))?,
            )),
            "union_pattern" => Ok(Node::new(NodeKind::MatchOr, self.patterns(&named(node))?)),
            "keyword_pattern" => {
                let value = named(node)
                    .into_iter()
                    .last()
                    .ok_or_else(|| ParseError::unsupported(&node))?;
                self.pattern(value)
            }
            "class_pattern" => {
                let mut children = Vec::new();
                for child in named(node) {
                    if child.kind() == "dotted_name" {
                        children.push(self.dotted_value(child)?);
                    } else {
                        children.push(self.pattern(child)?);
                    }
                }
                Ok(Node::new(NodeKind::MatchClass, children))
            }
            "dict_pattern" => {
                let keys = fields(node, "key");
                let mut children = Vec::new();
                for child in named(node) {
                    if child.kind() == "splat_pattern" {
                        children.push(Node::leaf(NodeKind::MatchStar));
                    } else if keys.iter().any(|key| key.id() == child.id()) {
                        let key = if child.kind() == "dotted_name" {
                            self.dotted_value(child)?
                        } else {
                            self.expr(child, ExprContext::Load)?
                        };
                        children.push(key);
                    } else {
                        children.push(self.pattern(child)?);
                    }
                }
                Ok(Node::new(NodeKind::MatchMapping, children))
            }
            _ => Ok(Node::new(
                NodeKind::MatchValue,
                vec![self.expr(node, ExprContext::Load)?],
            )),
        }
    }

    // ---- expressions -------------------------------------------------

    fn expr(&self, node: CstNode<'_>, context: ExprContext) -> Lowered {
        self.nested(node, || self.expr_node(node, context))
    }

    fn expr_node(&self, node: CstNode<'_>, context: ExprContext) -> Lowered {
        use ExprContext::Load;

        match node.kind() {
            "identifier" | "keyword_identifier" => self.name(node, context),
            "attribute" => Ok(Node::new(
                NodeKind::Attribute {
                    attr: self.text(required(node, "attribute")?)?.to_string(),
                },
                vec![self.expr(required(node, "object")?, Load)?, ctx(context)],
            )),
            "subscript" => {
                let slices = fields(node, "subscript");
                Ok(Node::new(
                    NodeKind::Subscript,
                    vec![
                        self.expr(required(node, "value")?, Load)?,
                        self.expr_or_tuple(&slices, Load)?,
                        ctx(context),
                    ],
                ))
            }
            "slice" => Ok(Node::new(
                NodeKind::Slice,
                self.expressions(&named(node), Load)?,
            )),
            "call" => self.call(node),
            "binary_operator" => {
                let operator = required(node, "operator")?;
                let operator = Operator::binary(operator.kind())
                    .ok_or_else(|| ParseError::unsupported(&operator))?;
                Ok(Node::new(
                    NodeKind::BinOp,
                    vec![
                        self.expr(required(node, "left")?, Load)?,
                        op(operator),
                        self.expr(required(node, "right")?, Load)?,
                    ],
                ))
            }
            "unary_operator" => {
                let operator = required(node, "operator")?;
                let operator = Operator::unary(operator.kind())
                    .ok_or_else(|| ParseError::unsupported(&operator))?;
                Ok(Node::new(
                    NodeKind::UnaryOp,
                    vec![op(operator), self.expr(required(node, "argument")?, Load)?],
                ))
            }
            "not_operator" => Ok(Node::new(
                NodeKind::UnaryOp,
                vec![
                    op(Operator::Not),
                    self.expr(required(node, "argument")?, Load)?,
                ],
            )),
            "boolean_operator" => self.boolean(node),
            "comparison_operator" => self.comparison(node),
            "integer" | "float" | "true" | "false" | "none" | "ellipsis" => {
                Ok(Node::leaf(NodeKind::Constant))
            }
            "string" | "concatenated_string" => self.string(node),
            "list" | "list_pattern" => Ok(sequence(
                NodeKind::List,
                self.expressions(&named(node), context)?,
                context,
            )),
            "tuple" | "tuple_pattern" | "expression_list" | "pattern_list" => Ok(sequence(
                NodeKind::Tuple,
                self.expressions(&named(node), context)?,
                context,
            )),
            "set" => Ok(Node::new(
                NodeKind::Set,
                self.expressions(&named(node), Load)?,
            )),
            "dictionary" => self.dictionary(node),
            "list_comprehension" => self.comprehension(node, NodeKind::ListComp),
            "set_comprehension" => self.comprehension(node, NodeKind::SetComp),
            "dictionary_comprehension" => self.comprehension(node, NodeKind::DictComp),
            "generator_expression" => self.comprehension(node, NodeKind::GeneratorExp),
            "lambda" => Ok(Node::new(
                NodeKind::Lambda,
                vec![
                    self.arguments(node.child_by_field_name("parameters"))?,
                    self.expr(required(node, "body")?, Load)?,
                ],
            )),
            "conditional_expression" => Ok(Node::new(
                NodeKind::IfExp,
                self.expressions(&named(node), Load)?,
            )),
            "parenthesized_expression" | "type" => self.expr(first_named(node)?, context),
            "generic_type" => {
                let parameters: Vec<_> = named(node)
                    .into_iter()
                    .filter(|c| c.kind() == "type_parameter")
                    .flat_map(named)
                    .collect();
                if parameters.is_empty() {
                    return Err(ParseError::unsupported(&node));
                }
                Ok(Node::new(
                    NodeKind::Subscript,
                    vec![
                        self.expr(first_named(node)?, Load)?,
                        self.expr_or_tuple(&parameters, Load)?,
                        ctx(context),
                    ],
                ))
            }
            "union_type" => match named(node).as_slice() {
                [left, right] => Ok(Node::new(
                    NodeKind::BinOp,
                    vec![
                        self.expr(*left, Load)?,
                        op(Operator::BitOr),
                        self.expr(*right, Load)?,
                    ],
                )),
                _ => Err(ParseError::unsupported(&node)),
            },
            "member_type" => match named(node).as_slice() {
                [value, attr] => Ok(Node::new(
                    NodeKind::Attribute {
                        attr: self.text(*attr)?.to_string(),
                    },
                    vec![self.expr(*value, Load)?, ctx(context)],
                )),
                _ => Err(ParseError::unsupported(&node)),
            },
            // `**P` only appears in type parameter lists
            "splat_type" if !has_token(node, "**") => Ok(Node::new(
                NodeKind::Starred,
                vec![self.expr(first_named(node)?, Load)?, ctx(context)],
            )),
            "await" => Ok(Node::new(
                NodeKind::Await,
                vec![self.expr(first_named(node)?, Load)?],
            )),
            "yield" => self.yield_expr(node),
            "named_expression" => Ok(Node::new(
                NodeKind::NamedExpr,
                vec![
                    self.expr(required(node, "name")?, ExprContext::Store)?,
                    self.expr(required(node, "value")?, Load)?,
                ],
            )),
            "list_splat" | "list_splat_pattern" | "parenthesized_list_splat" => Ok(Node::new(
                NodeKind::Starred,
                vec![self.expr(first_named(node)?, context)?, ctx(context)],
            )),
            _ => Err(ParseError::unsupported(&node)),
        }
    }

    fn call(&self, node: CstNode<'_>) -> Lowered {
        let mut children = vec![self.expr(required(node, "function")?, ExprContext::Load)?];

        let arguments = required(node, "arguments")?;
        if arguments.kind() == "generator_expression" {
            children.push(self.expr(arguments, ExprContext::Load)?);
        } else {
            children.extend(self.call_arguments(arguments)?);
        }
        Ok(Node::new(NodeKind::Call, children))
    }

    /// Positional and keyword arguments of a call or class header
    fn call_arguments(&self, list: CstNode<'_>) -> LoweredMany {
        named(list)
            .into_iter()
            .map(|argument| match argument.kind() {
                "keyword_argument" => Ok(Node::new(
                    NodeKind::Keyword {
                        arg: Some(self.text(required(argument, "name")?)?.to_string()),
                    },
                    vec![self.expr(required(argument, "value")?, ExprContext::Load)?],
                )),
                "dictionary_splat" => Ok(Node::new(
                    NodeKind::Keyword { arg: None },
                    vec![self.expr(first_named(argument)?, ExprContext::Load)?],
                )),
                _ => self.expr(argument, ExprContext::Load),
            })
            .collect()
    }

    fn boolean(&self, node: CstNode<'_>) -> Lowered {
        let token = required(node, "operator")?.kind();
        let operator = Operator::boolean(token).ok_or_else(|| ParseError::unsupported(&node))?;

        let mut children = vec![op(operator)];
        self.boolean_operands(node, token, &mut children)?;
        Ok(Node::new(NodeKind::BoolOp, children))
    }

    /// Collect operands, descending into left-nested chains of the same operator
    fn boolean_operands(
        &self,
        node: CstNode<'_>,
        token: &str,
        out: &mut Vec<Node>,
    ) -> Result<(), ParseError> {
        let left = required(node, "left")?;
        let same_operator = left.kind() == "boolean_operator"
            && left
                .child_by_field_name("operator")
                .is_some_and(|o| o.kind() == token);

        if same_operator {
            self.nested(left, || self.boolean_operands(left, token, out))?;
        } else {
            out.push(self.expr(left, ExprContext::Load)?);
        }
        out.push(self.expr(required(node, "right")?, ExprContext::Load)?);
        Ok(())
    }

    fn comparison(&self, node: CstNode<'_>) -> Lowered {
        let mut children = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for child in tokens(node) {
            if child.is_named() {
                if !pending.is_empty() {
                    let joined = pending.join(" ");
                    if joined == "<>" {
                        return Err(ParseError::legacy(&node, joined));
                    }
                    let operator = Operator::comparison(&joined)
                        .ok_or_else(|| ParseError::unsupported(&node))?;
                    children.push(op(operator));
                    pending.clear();
                }
                children.push(self.expr(child, ExprContext::Load)?);
            } else {
                pending.push(child.kind());
            }
        }
        Ok(Node::new(NodeKind::Compare, children))
    }

    fn is_fstring(&self, part: CstNode<'_>) -> Result<bool, ParseError> {
        let Some(start) = tokens(part).into_iter().find(|c| c.kind() == "string_start") else {
            return Ok(false);
        };
        let prefix = self.text(start)?;
        Ok(prefix
            .chars()
            .take_while(|c| *c != '"' && *c != '\'')
            .any(|c| c == 'f' || c == 'F'))
    }

    fn string(&self, node: CstNode<'_>) -> Lowered {
        let parts = if node.kind() == "concatenated_string" {
            named(node)
        } else {
            vec![node]
        };

        let mut formatted = false;
        for part in &parts {
            formatted |= self.is_fstring(*part)?;
        }
        if !formatted {
            return Ok(Node::leaf(NodeKind::Constant));
        }

        let mut children = Vec::new();
        let mut literal = false;
        for part in parts {
            let interpolates = self.is_fstring(part)?;
            for piece in tokens(part) {
                match piece.kind() {
                    "string_start" | "string_end" => {}
                    "interpolation" if interpolates => {
                        flush_literal(&mut children, &mut literal);
                        children.push(self.interpolation(piece)?);
                    }
                    _ => literal = true,
                }
            }
        }
        flush_literal(&mut children, &mut literal);
        Ok(Node::new(NodeKind::JoinedStr, children))
    }

    fn interpolation(&self, node: CstNode<'_>) -> Lowered {
        let value = match node.child_by_field_name("expression") {
            Some(value) => value,
            None => first_named(node)?,
        };
        let mut children = vec![self.expr(value, ExprContext::Load)?];

        if let Some(spec) = node.child_by_field_name("format_specifier") {
            let mut parts = Vec::new();
            let mut literal = false;
            for piece in tokens(spec) {
                match piece.kind() {
                    ":" => {}
                    "interpolation" | "format_expression" => {
                        flush_literal(&mut parts, &mut literal);
                        parts.push(self.interpolation(piece)?);
                    }
                    _ => literal = true,
                }
            }
            flush_literal(&mut parts, &mut literal);
            children.push(Node::new(NodeKind::JoinedStr, parts));
        }
        Ok(Node::new(NodeKind::FormattedValue, children))
    }

    fn dictionary(&self, node: CstNode<'_>) -> Lowered {
        let mut children = Vec::new();
        for entry in named(node) {
            match entry.kind() {
                "pair" => {
                    children.push(self.expr(required(entry, "key")?, ExprContext::Load)?);
                    children.push(self.expr(required(entry, "value")?, ExprContext::Load)?);
                }
                "dictionary_splat" => {
                    children.push(self.expr(first_named(entry)?, ExprContext::Load)?);
                }
                _ => return Err(ParseError::unsupported(&entry)),
            }
        }
        Ok(Node::new(NodeKind::Dict, children))
    }

    fn comprehension(&self, node: CstNode<'_>, kind: NodeKind) -> Lowered {
        let body = required(node, "body")?;
        let mut children = if body.kind() == "pair" {
            vec![
                self.expr(required(body, "key")?, ExprContext::Load)?,
                self.expr(required(body, "value")?, ExprContext::Load)?,
            ]
        } else {
            vec![self.expr(body, ExprContext::Load)?]
        };

        let mut current: Option<Vec<Node>> = None;
        for clause in named(node) {
            if clause.id() == body.id() {
                continue;
            }
            match clause.kind() {
                "for_in_clause" => {
                    if let Some(done) = current.take() {
                        children.push(Node::new(NodeKind::Comprehension, done));
                    }
                    let iterables = fields(clause, "right");
                    current = Some(vec![
                        self.expr(required(clause, "left")?, ExprContext::Store)?,
                        self.expr_or_tuple(&iterables, ExprContext::Load)?,
                    ]);
                }
                "if_clause" => {
                    let condition = self.expr(first_named(clause)?, ExprContext::Load)?;
                    current
                        .as_mut()
                        .ok_or_else(|| ParseError::unsupported(&clause))?
                        .push(condition);
                }
                _ => return Err(ParseError::unsupported(&clause)),
            }
        }
        if let Some(done) = current {
            children.push(Node::new(NodeKind::Comprehension, done));
        }
        Ok(Node::new(kind, children))
    }

    fn yield_expr(&self, node: CstNode<'_>) -> Lowered {
        let value = named(node).into_iter().next();
        if has_token(node, "from") {
            let value = value.ok_or_else(|| ParseError::unsupported(&node))?;
            return Ok(Node::new(
                NodeKind::YieldFrom,
                vec![self.expr(value, ExprContext::Load)?],
            ));
        }

        let children = match value {
            Some(value) => vec![self.expr(value, ExprContext::Load)?],
            None => Vec::new(),
        };
        Ok(Node::new(NodeKind::Yield, children))
    }
}
