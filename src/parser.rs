// parser.rs - Token stream to parse tree.
//
// Nodes live in an arena indexed by NodeId; parent and child links are
// indices, and document-order traversal is a pure function over the arena.
// The builder is recursive descent: alternation is a grammar production, so
// a closing paren never has to unwind through half-open alternation frames.
//
// Every node carries two offset pairs: start/end in raw source bytes, and
// parsed_start/parsed_end in the verbose-adjusted coordinate space (verbose
// whitespace and comments have zero parsed width). Checkers report raw
// offsets; the parsed track exists to reason about what actually consumes
// pattern positions.

use crate::chars::{builtin_codes, eval_char};
use crate::error::PatternError;
use crate::flags::PatternFlags;
use crate::tokenizer::{tokenize, Token, TokenKind};

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of group a Group node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Capturing,
    NonCapturing,
    NamedCapturing,
    Lookahead,
    NegativeLookahead,
    Lookbehind,
    NegativeLookbehind,
    /// Conditional on a prior group: `(?(1)...`.
    Exists,
}

impl GroupKind {
    pub fn is_lookaround(self) -> bool {
        matches!(
            self,
            GroupKind::Lookahead
                | GroupKind::NegativeLookahead
                | GroupKind::Lookbehind
                | GroupKind::NegativeLookbehind
        )
    }

    fn from_token(kind: TokenKind) -> GroupKind {
        match kind {
            TokenKind::OpenCapturing => GroupKind::Capturing,
            TokenKind::OpenNonCapturing => GroupKind::NonCapturing,
            TokenKind::OpenNamedCapturing => GroupKind::NamedCapturing,
            TokenKind::OpenLookahead => GroupKind::Lookahead,
            TokenKind::OpenNegativeLookahead => GroupKind::NegativeLookahead,
            TokenKind::OpenLookbehind => GroupKind::Lookbehind,
            TokenKind::OpenNegativeLookbehind => GroupKind::NegativeLookbehind,
            TokenKind::OpenExists => GroupKind::Exists,
            _ => panic!("not a group opener: {:?}", kind),
        }
    }
}

/// Node type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Concatenation sequence. The tree root, and each alternation branch.
    Progression,
    Alternation,
    Repetition,
    Group(GroupKind),
    CharClass,
    /// Every other token becomes a leaf carrying its token kind.
    Leaf(TokenKind),
}

/// Whether a node of this kind can consume characters when matching.
///
/// `Some(false)`: never consumes. `Some(true)`: consumes. `None`: depends on
/// the children; the caller must descend.
pub fn width(kind: NodeKind) -> Option<bool> {
    match kind {
        NodeKind::Leaf(TokenKind::Directive)
        | NodeKind::Leaf(TokenKind::Comment)
        | NodeKind::Leaf(TokenKind::VerboseWhitespace)
        | NodeKind::Leaf(TokenKind::VerboseComment) => Some(false),
        NodeKind::Leaf(k) if k.is_anchor() => Some(false),
        NodeKind::Group(g) if g.is_lookaround() => Some(false),
        NodeKind::Group(_)
        | NodeKind::Alternation
        | NodeKind::Progression
        | NodeKind::Repetition
        | NodeKind::Leaf(TokenKind::ExistsNamed) => None,
        _ => Some(true),
    }
}

// === CharClass payload ===

/// One resolved atom inside a character class: the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassAtom {
    pub kind: TokenKind,
    pub data: String,
    pub start: usize,
}

/// A resolved `a-b` range with both boundary tokens and their codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRange {
    pub a: ClassAtom,
    pub b: ClassAtom,
    pub codepoint_a: u32,
    pub codepoint_b: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Atom(ClassAtom),
    Range(CharRange),
}

/// Resolved payload of a CharClass node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassData {
    /// True if the class opened with `^`.
    pub negated: bool,
    /// Atoms and ranges, dashes already resolved: a `-` between two
    /// non-range operands forms a range; in first/last position or right
    /// after a formed range it stays a literal dash.
    pub chars: Vec<ClassItem>,
    /// Exact code points the class matches. Order-preserving for plain
    /// classes (duplicates retained); ascending after negation.
    pub matching_character_codes: Vec<u32>,
}

/// Resolved payload of a Repetition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSpec {
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
    pub greedy: bool,
    /// The operator token this spec came from.
    pub op: TokenKind,
}

// === Node ===

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Opening token text (type-dependent; empty for synthesized nodes).
    pub data: String,
    /// Closing token text: `)`, `]`, or the repetition operator.
    pub end_data: String,
    pub start: usize,
    pub end: usize,
    pub parsed_start: usize,
    pub parsed_end: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    class: Option<ClassData>,
    repeat: Option<RepeatSpec>,
}

impl Node {
    fn new(kind: NodeKind, data: String, start: usize, parsed_start: usize) -> Node {
        Node {
            kind,
            data,
            end_data: String::new(),
            start,
            end: start,
            parsed_start,
            parsed_end: parsed_start,
            parent: None,
            children: Vec::new(),
            class: None,
            repeat: None,
        }
    }

    /// CharClass payload; `None` for other node kinds.
    pub fn charclass(&self) -> Option<&ClassData> {
        self.class.as_ref()
    }

    /// Repetition payload; `None` for other node kinds.
    pub fn repeat(&self) -> Option<&RepeatSpec> {
        self.repeat.as_ref()
    }

    pub fn is_charclass(&self) -> bool {
        self.kind == NodeKind::CharClass
    }
}

// === ParseTree ===

/// The parse tree for one pattern: an arena of nodes plus the root.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// The original pattern text.
    pub raw: String,
    /// Flags the caller asked for.
    pub requested_flags: PatternFlags,
    /// Flags after merging inline directives.
    pub effective_flags: PatternFlags,
}

/// Parse `pattern` under `flags` into a tree.
///
/// Fails only when the host-style validation rejects the pattern; every
/// valid pattern parses (the catch-all literal rule consumes anything).
pub fn parse(pattern: &str, flags: PatternFlags) -> Result<ParseTree, PatternError> {
    ParseTree::parse(pattern, flags)
}

impl ParseTree {
    pub fn parse(pattern: &str, flags: PatternFlags) -> Result<ParseTree, PatternError> {
        let (tokens, effective) = tokenize(pattern, flags)?;
        let parsed_len: usize = tokens.iter().map(|t| t.parsed_len()).sum();

        let mut builder = TreeBuilder {
            tokens: &tokens,
            pos: 0,
            nodes: Vec::new(),
            raw_len: pattern.len(),
            parsed_len,
        };
        let root = builder.build()?;

        Ok(ParseTree {
            nodes: builder.nodes,
            root,
            raw: pattern.to_string(),
            requested_flags: flags,
            effective_flags: effective,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Parsed-coordinate end of the whole pattern.
    pub fn parsed_end(&self) -> usize {
        self.node(self.root).parsed_end
    }

    // --- document-order traversal ---

    /// The next node in document order: first child, else next sibling,
    /// else the nearest ancestor's next sibling.
    pub fn next_in_order(&self, id: NodeId) -> Option<NodeId> {
        if let Some(&first) = self.children(id).first() {
            return Some(first);
        }
        self.next_skipping_children(id)
    }

    /// The next node in document order that is not inside `id`'s subtree.
    pub fn next_skipping_children(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        loop {
            let parent = self.parent(cur)?;
            let siblings = self.children(parent);
            let at = siblings.iter().position(|&c| c == cur)?;
            if let Some(&next) = siblings.get(at + 1) {
                return Some(next);
            }
            cur = parent;
        }
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// All nodes from `first` onwards in document order (including `first`),
    /// stopping before `until` if given. Crosses subtree boundaries, so this
    /// continues to the end of the whole tree.
    pub fn walk_from(&self, first: NodeId, until: Option<NodeId>) -> Walk<'_> {
        Walk {
            tree: self,
            next: Some(first),
            until,
        }
    }

    /// Every node of the tree in document order, root included.
    pub fn walk(&self) -> Walk<'_> {
        self.walk_from(self.root, None)
    }

    /// All nodes strictly between `first` and `second`, excluding both. A
    /// `None` first means "from the beginning, not including the root"; a
    /// `None` second means "to the end".
    pub fn between(&self, first: Option<NodeId>, second: Option<NodeId>) -> Walk<'_> {
        let start = match first {
            Some(id) => self.next_skipping_children(id),
            None => self.children(self.root).first().copied(),
        };
        Walk {
            tree: self,
            next: start,
            until: second,
        }
    }

    // --- reconstruction ---

    /// Rebuild the exact source substring this node was parsed from.
    pub fn reconstruct(&self, id: NodeId) -> String {
        let node = self.node(id);
        match node.kind {
            NodeKind::Leaf(_) => node.data.clone(),
            NodeKind::Progression => self
                .children(id)
                .iter()
                .map(|&c| self.reconstruct(c))
                .collect(),
            NodeKind::Alternation => self
                .children(id)
                .iter()
                .map(|&c| self.reconstruct(c))
                .collect::<Vec<_>>()
                .join("|"),
            NodeKind::Repetition => {
                let mut s: String = self
                    .children(id)
                    .iter()
                    .map(|&c| self.reconstruct(c))
                    .collect();
                s.push_str(&node.end_data);
                s
            }
            NodeKind::Group(_) | NodeKind::CharClass => {
                let mut s = node.data.clone();
                for &c in self.children(id) {
                    s.push_str(&self.reconstruct(c));
                }
                s.push_str(&node.end_data);
                s
            }
        }
    }

    /// Pretty-print the subtree, one line per node, two-space indent.
    pub fn fmt_tree(&self, id: NodeId) -> Vec<String> {
        let node = self.node(id);
        if self.children(id).is_empty() {
            return vec![format!("<{:?} data={:?}>", node.kind, node.data)];
        }
        let mut lines = vec![format!("<{:?} data={:?}>", node.kind, node.data)];
        for &c in self.children(id) {
            lines.extend(self.fmt_tree(c).into_iter().map(|l| format!("  {}", l)));
        }
        lines
    }
}

/// Document-order iterator over the arena. See [`ParseTree::walk_from`].
pub struct Walk<'t> {
    tree: &'t ParseTree,
    next: Option<NodeId>,
    until: Option<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        if Some(cur) == self.until {
            self.next = None;
            return None;
        }
        self.next = self.tree.next_in_order(cur);
        Some(cur)
    }
}

// === Builder ===

struct TreeBuilder<'t> {
    tokens: &'t [Token],
    pos: usize,
    nodes: Vec<Node>,
    raw_len: usize,
    parsed_len: usize,
}

impl TreeBuilder<'_> {
    fn build(&mut self) -> Result<NodeId, PatternError> {
        let root = self.alloc(Node::new(NodeKind::Progression, String::new(), 0, 0));
        self.parse_body(root)?;
        // validation guarantees every CloseParen was consumed by a group
        assert!(
            self.pos >= self.tokens.len(),
            "token stream not fully consumed at {}",
            self.pos
        );
        self.nodes[root.index()].end = self.raw_len;
        self.nodes[root.index()].parsed_end = self.parsed_len;
        Ok(root)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        self.pos += 1;
        t
    }

    /// Raw and parsed offsets of the current stopping point: the next
    /// token's starts, or the total lengths at end of stream.
    fn stop_pos(&self) -> (usize, usize) {
        match self.peek() {
            Some(t) => (t.start, t.parsed_start),
            None => (self.raw_len, self.parsed_len),
        }
    }

    /// Fill `container` with children until a CloseParen (left unconsumed)
    /// or end of stream. An alternate bar restructures the collected
    /// sequence into an Alternation.
    fn parse_body(&mut self, container: NodeId) -> Result<(), PatternError> {
        loop {
            match self.peek().map(|t| t.kind) {
                None | Some(TokenKind::CloseParen) => return Ok(()),
                Some(TokenKind::Alternate) => return self.parse_alternation(container),
                Some(_) => self.parse_item(container)?,
            }
        }
    }

    /// Called with the cursor on the first `|` of this nesting level. Moves
    /// the sequence collected so far into the first branch, then parses the
    /// remaining branches as siblings.
    fn parse_alternation(&mut self, container: NodeId) -> Result<(), PatternError> {
        let (c_start, c_parsed, data_len) = {
            let c = &self.nodes[container.index()];
            (c.start, c.parsed_start, c.data.len())
        };
        let content_start = c_start + data_len;
        let content_parsed = c_parsed + data_len;

        let alternation = self.alloc(Node::new(
            NodeKind::Alternation,
            String::new(),
            content_start,
            content_parsed,
        ));

        // first branch: everything already collected
        let first = self.alloc(Node::new(
            NodeKind::Progression,
            String::new(),
            content_start,
            content_parsed,
        ));
        let moved = std::mem::take(&mut self.nodes[container.index()].children);
        for child in moved {
            self.attach(first, child);
        }
        let (bar_raw, bar_parsed) = self.stop_pos();
        self.nodes[first.index()].end = bar_raw;
        self.nodes[first.index()].parsed_end = bar_parsed;
        self.attach(alternation, first);

        while matches!(self.peek().map(|t| t.kind), Some(TokenKind::Alternate)) {
            let (b_start, b_parsed) = {
                let bar = self.advance();
                (bar.end(), bar.parsed_end())
            };
            let branch = self.alloc(Node::new(
                NodeKind::Progression,
                String::new(),
                b_start,
                b_parsed,
            ));
            loop {
                match self.peek().map(|t| t.kind) {
                    None | Some(TokenKind::CloseParen) | Some(TokenKind::Alternate) => break,
                    Some(_) => self.parse_item(branch)?,
                }
            }
            let (stop_raw, stop_parsed) = self.stop_pos();
            self.nodes[branch.index()].end = stop_raw;
            self.nodes[branch.index()].parsed_end = stop_parsed;
            self.attach(alternation, branch);
        }

        let (stop_raw, stop_parsed) = self.stop_pos();
        self.nodes[alternation.index()].end = stop_raw;
        self.nodes[alternation.index()].parsed_end = stop_parsed;
        self.attach(container, alternation);
        Ok(())
    }

    fn parse_item(&mut self, container: NodeId) -> Result<(), PatternError> {
        let token = self.advance().clone();
        match token.kind {
            kind if kind.opens_group() => {
                let group = self.alloc(Node::new(
                    NodeKind::Group(GroupKind::from_token(kind)),
                    token.text,
                    token.start,
                    token.parsed_start,
                ));
                self.parse_body(group)?;
                let close = self
                    .peek()
                    .filter(|t| t.kind == TokenKind::CloseParen)
                    .expect("group left unclosed by validated token stream")
                    .clone();
                self.pos += 1;
                let close_end = close.end();
                let close_parsed_end = close.parsed_end();
                let g = &mut self.nodes[group.index()];
                g.end_data = close.text;
                g.end = close_end;
                g.parsed_end = close_parsed_end;
                self.attach(container, group);
            }
            TokenKind::OpenCharClass => {
                let class = self.parse_charclass(token)?;
                self.attach(container, class);
            }
            kind if kind.is_repetition() => {
                let operand = self.nodes[container.index()]
                    .children
                    .pop()
                    .expect("repetition with no operand in validated token stream");
                let (op_start, op_parsed) = {
                    let o = &self.nodes[operand.index()];
                    (o.start, o.parsed_start)
                };
                let repetition = self.alloc(Node::new(
                    NodeKind::Repetition,
                    String::new(),
                    op_start,
                    op_parsed,
                ));
                {
                    let r = &mut self.nodes[repetition.index()];
                    r.end_data = token.text.clone();
                    r.end = token.end();
                    r.parsed_end = token.parsed_end();
                    r.repeat = Some(repeat_spec(kind, &token.text));
                }
                self.attach(repetition, operand);
                self.attach(container, repetition);
            }
            _ => {
                let leaf = self.leaf(&token);
                self.attach(container, leaf);
            }
        }
        Ok(())
    }

    fn leaf(&mut self, token: &Token) -> NodeId {
        let mut node = Node::new(
            NodeKind::Leaf(token.kind),
            token.text.clone(),
            token.start,
            token.parsed_start,
        );
        node.end = token.end();
        node.parsed_end = token.parsed_end();
        self.alloc(node)
    }

    fn parse_charclass(&mut self, open: Token) -> Result<NodeId, PatternError> {
        let class = self.alloc(Node::new(
            NodeKind::CharClass,
            open.text,
            open.start,
            open.parsed_start,
        ));
        loop {
            let token = self
                .peek()
                .expect("character class left unclosed by validated token stream")
                .clone();
            self.pos += 1;
            if token.kind == TokenKind::CloseCharClass {
                let c = &mut self.nodes[class.index()];
                c.end_data = token.text.clone();
                c.end = token.end();
                c.parsed_end = token.parsed_end();
                break;
            }
            let leaf = self.leaf(&token);
            self.attach(class, leaf);
        }
        let data = self.resolve_charclass(class)?;
        self.nodes[class.index()].class = Some(data);
        Ok(class)
    }

    // Resolve dashes into ranges, the leading caret into negation, and
    // expand the matched code set.
    fn resolve_charclass(&self, class: NodeId) -> Result<ClassData, PatternError> {
        let atoms: Vec<ClassAtom> = self.nodes[class.index()]
            .children
            .iter()
            .map(|&c| {
                let n = &self.nodes[c.index()];
                let kind = match n.kind {
                    NodeKind::Leaf(k) => k,
                    _ => unreachable!("non-leaf child in character class"),
                };
                ClassAtom {
                    kind,
                    data: n.data.clone(),
                    start: n.start,
                }
            })
            .collect();

        let mut negated = false;
        let mut chars: Vec<ClassItem> = Vec::new();
        let mut it = atoms.into_iter().peekable();
        while let Some(atom) = it.next() {
            if chars.is_empty() && !negated && atom.kind == TokenKind::ClassNegate {
                negated = true;
                continue;
            }
            if atom.kind == TokenKind::ClassSpecial && atom.data == "-" {
                // dash forms a range only between two non-range operands
                let last_is_atom = matches!(chars.last(), Some(ClassItem::Atom(_)));
                if last_is_atom && it.peek().is_some() {
                    let low = match chars.pop() {
                        Some(ClassItem::Atom(a)) => a,
                        _ => unreachable!(),
                    };
                    let high = it.next().expect("peeked");
                    let codepoint_a = self.decode(&low)?;
                    let codepoint_b = self.decode(&high)?;
                    chars.push(ClassItem::Range(CharRange {
                        a: low,
                        b: high,
                        codepoint_a,
                        codepoint_b,
                    }));
                    continue;
                }
            }
            chars.push(ClassItem::Atom(atom));
        }

        let mut codes: Vec<u32> = Vec::new();
        for item in &chars {
            match item {
                ClassItem::Range(r) => {
                    codes.extend(r.codepoint_a..=r.codepoint_b);
                }
                ClassItem::Atom(a) if a.kind == TokenKind::BuiltinCharclass => {
                    codes.extend(builtin_codes(a.data.as_bytes()[1]));
                }
                ClassItem::Atom(a) => {
                    codes.push(self.decode(a)?);
                }
            }
        }
        if negated {
            let matched: std::collections::HashSet<u32> = codes.iter().copied().collect();
            codes = (0u32..256).filter(|c| !matched.contains(c)).collect();
        }

        Ok(ClassData {
            negated,
            chars,
            matching_character_codes: codes,
        })
    }

    fn decode(&self, atom: &ClassAtom) -> Result<u32, PatternError> {
        eval_char(&atom.data).map_err(|msg| PatternError::escape(atom.start, msg))
    }
}

fn repeat_spec(op: TokenKind, text: &str) -> RepeatSpec {
    let (min, max, greedy) = match op {
        TokenKind::RepeatStar => (0, None, true),
        TokenKind::RepeatNongreedyStar => (0, None, false),
        TokenKind::RepeatPlus => (1, None, true),
        TokenKind::RepeatNongreedyPlus => (1, None, false),
        // a lone `?` operator is itself greedy
        TokenKind::RepeatQuestion => (0, Some(1), true),
        TokenKind::RepeatNongreedyQuestion => (0, Some(1), false),
        TokenKind::RepeatCurly => {
            let greedy = !text.ends_with('?');
            let body = text
                .trim_end_matches('?')
                .trim_start_matches('{')
                .trim_end_matches('}');
            let (min, max) = match body.split_once(',') {
                Some((lo, hi)) => (
                    lo.parse().unwrap_or(0),
                    if hi.is_empty() { None } else { hi.parse().ok() },
                ),
                None => {
                    let n = body.parse().unwrap_or(0);
                    (n, Some(n))
                }
            };
            (min, max, greedy)
        }
        _ => panic!("not a repetition operator: {:?}", op),
    };
    RepeatSpec { min, max, greedy, op }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree(pattern: &str) -> ParseTree {
        ParseTree::parse(pattern, PatternFlags::empty()).unwrap()
    }

    fn kinds_of_children(t: &ParseTree, id: NodeId) -> Vec<NodeKind> {
        t.children(id).iter().map(|&c| t.node(c).kind).collect()
    }

    #[test]
    fn roundtrip_reconstruction() {
        for pattern in [
            r"a|b|",
            r"((a(?:b))|)",
            r"x{1,}",
            r"x{,5}?",
            r"\b(foo|bar)\b",
            r"[^(\[\])]*",
            r"(?P<name>\w+)\s*(?P=name)",
            r"a{1}b{2,3}c??",
            r"(?x)foo # comment",
            r"(foo|bar|@|@@)",
            r"[0-9-_]",
            r"[]x]",
            "caf\u{e9}[\u{e0}-\u{ff}]",
        ] {
            let t = tree(pattern);
            assert_eq!(t.reconstruct(t.root()), pattern, "pattern {:?}", pattern);
        }
    }

    #[test]
    fn root_spans() {
        let t = tree(r"\b(foo|bar)\b");
        let root = t.node(t.root());
        assert_eq!(root.start, 0);
        assert_eq!(root.end, 13);
        let group = t.children(t.root())[1];
        assert_eq!(t.node(group).start, 2);
        assert_eq!(t.node(group).end, 11);
    }

    #[test]
    fn alternation_structure() {
        let t = tree("a|b|c");
        let alts = kinds_of_children(&t, t.root());
        assert_eq!(alts, vec![NodeKind::Alternation]);
        let alt = t.children(t.root())[0];
        // all branches are siblings, not right-nested
        assert_eq!(
            kinds_of_children(&t, alt),
            vec![NodeKind::Progression; 3]
        );
    }

    #[test]
    fn empty_trailing_branch() {
        let t = tree("a|");
        let alt = t.children(t.root())[0];
        let branches = t.children(alt);
        assert_eq!(branches.len(), 2);
        assert!(t.children(branches[1]).is_empty());
        assert_eq!(t.node(branches[1]).start, 2);
        assert_eq!(t.node(branches[1]).end, 2);
    }

    #[test]
    fn alternation_inside_group() {
        let t = tree("(foo|bar)|[ba]z");
        assert_eq!(t.reconstruct(t.root()), "(foo|bar)|[ba]z");
        let outer = t.children(t.root())[0];
        assert_eq!(t.node(outer).kind, NodeKind::Alternation);
        let first_branch = t.children(outer)[0];
        let group = t.children(first_branch)[0];
        assert_eq!(t.node(group).kind, NodeKind::Group(GroupKind::Capturing));
        let inner_alt = t.children(group)[0];
        assert_eq!(t.node(inner_alt).kind, NodeKind::Alternation);
        assert_eq!(t.children(inner_alt).len(), 2);
    }

    #[test]
    fn repetition_wraps_operand() {
        let t = tree("ab*");
        let children = kinds_of_children(&t, t.root());
        assert_eq!(
            children,
            vec![
                NodeKind::Leaf(TokenKind::Literal),
                NodeKind::Repetition,
            ]
        );
        let rep = t.children(t.root())[1];
        assert_eq!(t.node(rep).start, 1);
        assert_eq!(t.node(rep).end, 3);
        assert_eq!(t.node(rep).end_data, "*");
        let spec = t.node(rep).repeat().unwrap();
        assert_eq!((spec.min, spec.max, spec.greedy), (0, None, true));
        assert_eq!(spec.op, TokenKind::RepeatStar);
    }

    #[test]
    fn repeat_specs() {
        let spec = |p: &str| {
            let t = tree(p);
            let rep = t.children(t.root())[0];
            let s = *t.node(rep).repeat().unwrap();
            (s.min, s.max, s.greedy)
        };
        assert_eq!(spec("a+"), (1, None, true));
        assert_eq!(spec("a+?"), (1, None, false));
        assert_eq!(spec("a?"), (0, Some(1), true));
        assert_eq!(spec("a??"), (0, Some(1), false));
        assert_eq!(spec("a{3}"), (3, Some(3), true));
        assert_eq!(spec("a{1,}"), (1, None, true));
        assert_eq!(spec("a{,5}?"), (0, Some(5), false));
        assert_eq!(spec("a{2,4}"), (2, Some(4), true));
    }

    #[test]
    fn charclass_range_resolution() {
        let t = tree("[a-z]");
        let class = t.children(t.root())[0];
        let data = t.node(class).charclass().unwrap();
        assert_eq!(data.chars.len(), 1);
        match &data.chars[0] {
            ClassItem::Range(r) => {
                assert_eq!(r.codepoint_a, 97);
                assert_eq!(r.codepoint_b, 122);
            }
            other => panic!("expected range, got {:?}", other),
        }
        assert_eq!(data.matching_character_codes.len(), 26);
    }

    #[test]
    fn charclass_dash_positions() {
        // leading dash is literal
        let t = tree("[-_]");
        let data = t.node(t.children(t.root())[0]).charclass().unwrap().clone();
        assert_eq!(data.chars.len(), 2);
        assert!(matches!(&data.chars[0], ClassItem::Atom(a) if a.data == "-"));

        // trailing dash is literal
        let t = tree("[_-]");
        let data = t.node(t.children(t.root())[0]).charclass().unwrap().clone();
        assert_eq!(data.chars.len(), 2);
        assert!(matches!(&data.chars[1], ClassItem::Atom(a) if a.data == "-"));

        // dash right after a formed range is literal
        let t = tree("[0-9-_]");
        let data = t.node(t.children(t.root())[0]).charclass().unwrap().clone();
        assert_eq!(data.chars.len(), 3);
        assert!(matches!(&data.chars[0], ClassItem::Range(r)
            if r.a.data == "0" && r.b.data == "9"));
        assert!(matches!(&data.chars[1], ClassItem::Atom(a) if a.data == "-"));
        assert!(matches!(&data.chars[2], ClassItem::Atom(a) if a.data == "_"));
    }

    #[test]
    fn charclass_negation() {
        let t = tree("[^xx]");
        let data = t.node(t.children(t.root())[0]).charclass().unwrap();
        assert!(data.negated);
        assert_eq!(data.matching_character_codes.len(), 255);
        assert!(!data.matching_character_codes.contains(&120));
    }

    #[test]
    fn charclass_code_fidelity() {
        let cases: Vec<(&str, Vec<u32>)> = vec![
            ("[a-b]", vec![97, 98]),
            ("[ab]", vec![97, 98]),
            ("[ba]", vec![98, 97]),
            (r"[\x41-\x43]", vec![65, 66, 67]),
            (r"[\010]", vec![8]),
            (r"[\n]", vec![10]),
            (r"[\d]", (48..=57).collect()),
        ];
        for (pattern, want) in cases {
            let t = tree(pattern);
            let data = t.node(t.children(t.root())[0]).charclass().unwrap();
            assert_eq!(
                data.matching_character_codes, want,
                "pattern {:?}",
                pattern
            );
        }
    }

    #[test]
    fn charclass_duplicates_preserved() {
        let t = tree(r"[\d1]");
        let data = t.node(t.children(t.root())[0]).charclass().unwrap();
        assert_eq!(data.matching_character_codes.len(), 11);
    }

    #[test]
    fn bracket_literal_quirk() {
        let t = tree("[^]]+");
        let rep = t.children(t.root())[0];
        assert_eq!(t.node(rep).kind, NodeKind::Repetition);
        let class = t.children(rep)[0];
        let data = t.node(class).charclass().unwrap();
        assert!(data.negated);
        assert_eq!(data.matching_character_codes.len(), 255);
        assert!(!data.matching_character_codes.contains(&(']' as u32)));
    }

    #[test]
    fn group_kinds() {
        let t = tree("(?=a)(?!b)(?<=c)(?<!d)(?:e)(f)");
        let kinds = kinds_of_children(&t, t.root());
        assert_eq!(
            kinds,
            vec![
                NodeKind::Group(GroupKind::Lookahead),
                NodeKind::Group(GroupKind::NegativeLookahead),
                NodeKind::Group(GroupKind::Lookbehind),
                NodeKind::Group(GroupKind::NegativeLookbehind),
                NodeKind::Group(GroupKind::NonCapturing),
                NodeKind::Group(GroupKind::Capturing),
            ]
        );
    }

    #[test]
    fn directives_found_by_walk() {
        let t = tree("(?x)(?i)");
        let directives: Vec<NodeId> = t
            .walk()
            .filter(|&id| t.node(id).kind == NodeKind::Leaf(TokenKind::Directive))
            .collect();
        assert_eq!(directives.len(), 2);
    }

    #[test]
    fn walk_order_and_between() {
        let t = tree("a(b)c");
        let order: Vec<NodeKind> = t.walk().map(|id| t.node(id).kind).collect();
        assert_eq!(
            order,
            vec![
                NodeKind::Progression,
                NodeKind::Leaf(TokenKind::Literal),
                NodeKind::Group(GroupKind::Capturing),
                NodeKind::Leaf(TokenKind::Literal),
                NodeKind::Leaf(TokenKind::Literal),
            ]
        );

        let group = t.children(t.root())[1];
        let after: Vec<NodeId> = t.between(Some(group), None).collect();
        assert_eq!(after.len(), 1);
        assert_eq!(t.node(after[0]).data, "c");

        let from_start: Vec<NodeId> = t.between(None, Some(group)).collect();
        assert_eq!(from_start.len(), 1);
        assert_eq!(t.node(from_start[0]).data, "a");
    }

    #[test]
    fn parsed_offsets_in_verbose_mode() {
        let t = tree("(?x)foo ");
        // trailing whitespace has zero parsed width
        let last = *t.children(t.root()).last().unwrap();
        assert_eq!(t.node(last).kind, NodeKind::Leaf(TokenKind::VerboseWhitespace));
        assert_eq!(t.node(last).end, 8);
        assert_eq!(t.node(last).parsed_end, 7);
        assert_eq!(t.parsed_end(), 7);

        let t = tree("(?x)foo[ ]");
        let last = *t.children(t.root()).last().unwrap();
        assert_eq!(t.node(last).kind, NodeKind::CharClass);
        assert_eq!(t.node(last).parsed_end, t.raw.len());
    }

    #[test]
    fn effective_flags_from_directive() {
        let t = tree("(?i)a");
        assert!(t.effective_flags.contains(PatternFlags::IGNORECASE));
        assert!(!t.requested_flags.contains(PatternFlags::IGNORECASE));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(ParseTree::parse("(a", PatternFlags::empty()).is_err());
        assert!(ParseTree::parse("a)", PatternFlags::empty()).is_err());
        assert!(ParseTree::parse("*", PatternFlags::empty()).is_err());
    }

    #[test]
    fn descendant_checks() {
        let t = tree("(a(b))");
        let outer = t.children(t.root())[0];
        let inner = t.children(outer)[1];
        let b = t.children(inner)[0];
        assert!(t.is_descendant_of(b, inner));
        assert!(t.is_descendant_of(b, outer));
        assert!(t.is_descendant_of(b, t.root()));
        assert!(!t.is_descendant_of(outer, inner));
    }
}
