//! Comment collection and attachment.
//!
//! Nodes are finished bottom-up, so the handler sees every child before its
//! parent. Attachments are recorded by [`NodeId`] while parsing and written
//! into the tree once the `Program` node exists.

use rustc_hash::FxHashMap;

use crate::ast::{Comment, Node, NodeId, NodeKind};
use crate::span::Metadata;

#[derive(Debug, Clone)]
struct Entry {
    comment: Comment,
    start: usize,
}

#[derive(Debug, Clone, Copy)]
struct Finished {
    id: NodeId,
    start: usize,
}

#[derive(Debug, Default)]
pub(crate) struct CommentHandler {
    attach: bool,
    comments: Vec<Comment>,
    /// Finished nodes that may still give up leading comments to a parent.
    stack: Vec<Finished>,
    leading: Vec<Entry>,
    trailing: Vec<Entry>,
    leading_of: FxHashMap<NodeId, Vec<Comment>>,
    trailing_of: FxHashMap<NodeId, Vec<Comment>>,
    inner_of: FxHashMap<NodeId, Vec<Comment>>,
}

impl CommentHandler {
    pub(crate) fn new(attach: bool) -> Self {
        Self {
            attach,
            ..Self::default()
        }
    }

    pub(crate) fn visit_comment(&mut self, comment: &Comment, metadata: &Metadata) {
        self.comments.push(comment.clone());
        if !self.attach {
            return;
        }

        let entry = Entry {
            comment: Comment {
                kind: comment.kind,
                value: comment.value.clone(),
                range: Some([metadata.start.offset as u32, metadata.end.offset as u32]),
                loc: comment.loc.clone(),
            },
            start: metadata.start.offset,
        };
        self.leading.push(entry.clone());
        self.trailing.push(entry);
    }

    pub(crate) fn visit_node(&mut self, node: &Node, metadata: &Metadata) {
        if !self.attach {
            return;
        }
        if let NodeKind::Program { body, .. } = &node.kind {
            if !body.is_empty() {
                return;
            }
        }

        self.insert_inner_comments(node, metadata);
        let trailing = self.find_trailing_comments(metadata);
        let leading = self.find_leading_comments(metadata);
        if !leading.is_empty() {
            self.leading_of.insert(node.id, leading);
        }
        if !trailing.is_empty() {
            self.trailing_of.insert(node.id, trailing);
        }

        self.stack.push(Finished {
            id: node.id,
            start: metadata.start.offset,
        });
    }

    /// Comments inside an empty block, e.g. `function f() { /* todo */ }`.
    fn insert_inner_comments(&mut self, node: &Node, metadata: &Metadata) {
        if !node.kind.is_empty_block() {
            return;
        }

        let end = metadata.end.offset;
        let (inner, rest): (Vec<Entry>, Vec<Entry>) = self.leading.drain(..).partition(|e| end >= e.start);
        self.leading = rest;
        if inner.is_empty() {
            return;
        }
        self.trailing.retain(|t| !inner.iter().any(|e| e.start == t.start));
        self.inner_of.insert(node.id, inner.into_iter().map(|e| e.comment).collect());
    }

    fn find_trailing_comments(&mut self, metadata: &Metadata) -> Vec<Comment> {
        let end = metadata.end.offset;
        if !self.trailing.is_empty() {
            return self
                .trailing
                .drain(..)
                .filter(|e| e.start >= end)
                .map(|e| e.comment)
                .collect();
        }

        // A trailing comment claimed by the last child moves to its parent
        // when it lies past the parent's end too.
        let Some(last) = self.stack.last() else {
            return Vec::new();
        };
        let claimed = self.trailing_of.get(&last.id).and_then(|comments| comments.first()).is_some_and(|first| {
            first.range.is_some_and(|r| r[0] as usize >= end)
        });
        if claimed {
            self.trailing_of.remove(&last.id).unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    fn find_leading_comments(&mut self, metadata: &Metadata) -> Vec<Comment> {
        let start = metadata.start.offset;

        let mut target = None;
        while let Some(entry) = self.stack.last() {
            if entry.start < start {
                break;
            }
            target = Some(entry.id);
            self.stack.pop();
        }

        if let Some(target) = target {
            let Some(comments) = self.leading_of.remove(&target) else {
                return Vec::new();
            };
            let (taken, kept): (Vec<Comment>, Vec<Comment>) = comments
                .into_iter()
                .partition(|c| c.range.is_some_and(|r| r[1] as usize <= start));
            if !kept.is_empty() {
                self.leading_of.insert(target, kept);
            }
            return taken;
        }

        let (taken, rest): (Vec<Entry>, Vec<Entry>) = self.leading.drain(..).partition(|e| e.start <= start);
        self.leading = rest;
        taken.into_iter().map(|e| e.comment).collect()
    }

    /// Write the recorded attachments into the tree and return every comment
    /// seen, in source order.
    pub(crate) fn finish(self, root: &mut Node) -> Vec<Comment> {
        if self.attach {
            tracing::trace!(
                leading = self.leading_of.len(),
                trailing = self.trailing_of.len(),
                inner = self.inner_of.len(),
                "attaching comments"
            );
            self.apply(root);
        }
        self.comments
    }

    fn apply(&self, node: &mut Node) {
        if let Some(comments) = self.leading_of.get(&node.id) {
            node.leading_comments = Some(comments.clone());
        }
        if let Some(comments) = self.trailing_of.get(&node.id) {
            node.trailing_comments = Some(comments.clone());
        }
        if let Some(comments) = self.inner_of.get(&node.id) {
            node.inner_comments = Some(comments.clone());
        }
        node.for_each_child_mut(&mut |child| self.apply(child));
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::CommentKind;
    use crate::options::ParseOptions;
    use crate::parser::Parser;

    fn attach(source: &str) -> serde_json::Value {
        let options = ParseOptions::new().with_attach_comment(true).with_range(true);
        Parser::new(source, &options, None)
            .and_then(Parser::parse_program)
            .unwrap()
            .to_json()
            .unwrap()
    }

    #[test]
    fn test_comment_list() {
        let options = ParseOptions::new().with_comment(true);
        let program = Parser::new("// one\na /* two */;", &options, None)
            .and_then(Parser::parse_program)
            .unwrap();
        let comments = program.comments.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].kind, CommentKind::Line);
        assert_eq!(comments[0].value, " one");
        assert_eq!(comments[1].kind, CommentKind::Block);
        assert!(comments[1].range.is_none());
    }

    #[test]
    fn test_no_comments_without_option() {
        let program = Parser::new("a // b", &ParseOptions::new(), None)
            .and_then(Parser::parse_program)
            .unwrap();
        assert!(program.comments.is_none());
    }

    #[test]
    fn test_leading_and_trailing() {
        let json = attach("/* lead */ a; // trail");
        let stmt = &json["body"][0];
        assert_eq!(stmt["leadingComments"][0]["value"], " lead ");
        assert_eq!(stmt["leadingComments"][0]["range"], serde_json::json!([0, 10]));
        assert_eq!(stmt["trailingComments"][0]["value"], " trail");
        assert!(json.get("leadingComments").is_none());
    }

    #[test]
    fn test_leading_goes_to_outermost_node() {
        let json = attach("// doc\nfoo(bar);");
        let stmt = &json["body"][0];
        assert_eq!(stmt["leadingComments"][0]["value"], " doc");
        assert!(stmt["expression"].get("leadingComments").is_none());
        assert!(stmt["expression"]["callee"].get("leadingComments").is_none());
    }

    #[test]
    fn test_inner_comments_of_empty_block() {
        let json = attach("function f() { /* nothing */ }");
        let body = &json["body"][0]["body"];
        assert_eq!(body["innerComments"][0]["value"], " nothing ");
        assert!(body.get("trailingComments").is_none());
    }

    #[test]
    fn test_empty_program_keeps_comments() {
        let json = attach("// only");
        assert_eq!(json["leadingComments"][0]["value"], " only");
    }
}
