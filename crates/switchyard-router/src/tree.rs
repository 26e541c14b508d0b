//! Radix trie storing the route patterns of one HTTP method.
//!
//! Each node owns a byte segment of the registered patterns. Static
//! children are ordered by descending priority (number of handlers in the
//! subtree) and indexed by their first byte so lookup can pick the next
//! edge without scanning. Wildcard children hang off `wild_child`; a
//! catch-all is stored as a two-node chain reached through a `/` index so
//! the captured value always includes its leading slash.

use std::sync::Arc;

use crate::error::RouteError;
use crate::handler::Handler;
use crate::params::Params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NodeKind {
    #[default]
    Static,
    Root,
    Param,
    CatchAll,
}

/// One trie node.
#[derive(Clone, Default)]
pub(crate) struct Node {
    path: String,
    indices: Vec<u8>,
    wild_child: bool,
    kind: NodeKind,
    priority: u32,
    children: Vec<Node>,
    handler: Option<Arc<dyn Handler>>,
    pattern: Option<Arc<str>>,
}

/// Outcome of a tree lookup.
pub(crate) struct NodeLookup {
    /// Handler at the matched terminal node, if any.
    pub(crate) handler: Option<Arc<dyn Handler>>,
    /// Registered pattern of the matched route.
    pub(crate) pattern: Option<Arc<str>>,
    /// True when no handler matched but adding or removing a trailing
    /// slash would reach one.
    pub(crate) tsr: bool,
}

impl NodeLookup {
    fn miss(tsr: bool) -> Self {
        Self {
            handler: None,
            pattern: None,
            tsr,
        }
    }
}

/// Number of `:param` and `*catchall` markers in a pattern.
pub(crate) fn count_params(pattern: &str) -> usize {
    pattern.bytes().filter(|&c| c == b':' || c == b'*').count()
}

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    let max = a.len().min(b.len());
    let mut i = 0;
    while i < max && a[i] == b[i] {
        i += 1;
    }
    i
}

/// Locate the next wildcard segment in `path`. Returns the wildcard
/// (including the `:` or `*` marker), its byte offset, and whether the
/// segment is free of further markers.
fn find_wildcard(path: &str) -> Option<(&str, usize, bool)> {
    for (start, &c) in path.as_bytes().iter().enumerate() {
        if c != b':' && c != b'*' {
            continue;
        }
        let mut valid = true;
        for (end, &c) in path.as_bytes()[start + 1..].iter().enumerate() {
            match c {
                b'/' => return Some((&path[start..start + 1 + end], start, valid)),
                b':' | b'*' => valid = false,
                _ => {}
            }
        }
        return Some((&path[start..], start, valid));
    }
    None
}

fn swap_ascii_case(c: u8) -> u8 {
    if c.is_ascii_alphabetic() { c ^ 0x20 } else { c }
}

impl Node {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `pattern`, growing the trie as needed.
    ///
    /// On error the trie may hold partially inserted structure; callers
    /// that need atomicity insert into a clone and commit on success.
    pub(crate) fn add_route(
        &mut self,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let full = pattern;
        self.priority += 1;

        // Empty tree
        if self.path.is_empty() && self.indices.is_empty() {
            self.insert_child(pattern, full, handler)?;
            self.kind = NodeKind::Root;
            return Ok(());
        }

        let mut n: &mut Node = self;
        let mut path = pattern;

        loop {
            let i = longest_common_prefix(path.as_bytes(), n.path.as_bytes());

            // Split the edge when the new pattern diverges inside this
            // node's segment.
            if i < n.path.len() {
                let child = Node {
                    path: n.path[i..].to_string(),
                    indices: std::mem::take(&mut n.indices),
                    wild_child: n.wild_child,
                    kind: NodeKind::Static,
                    priority: n.priority - 1,
                    children: std::mem::take(&mut n.children),
                    handler: n.handler.take(),
                    pattern: n.pattern.take(),
                };
                n.indices = vec![n.path.as_bytes()[i]];
                n.children = vec![child];
                n.path.truncate(i);
                n.wild_child = false;
            }

            // Descend with the unmatched suffix.
            if i < path.len() {
                path = &path[i..];

                if n.wild_child {
                    let tmp = n;
                    n = &mut tmp.children[0];
                    n.priority += 1;

                    // The existing wildcard is compatible only if the new
                    // pattern repeats it byte for byte and ends the
                    // segment at the same place.
                    if path.len() >= n.path.len()
                        && n.path.as_bytes() == &path.as_bytes()[..n.path.len()]
                        && n.kind != NodeKind::CatchAll
                        && (n.path.len() >= path.len() || path.as_bytes()[n.path.len()] == b'/')
                    {
                        continue;
                    }

                    let segment = if n.kind == NodeKind::CatchAll {
                        path
                    } else {
                        path.split('/').next().unwrap_or(path)
                    };
                    let existing = match full.find(segment) {
                        Some(pos) => format!("{}{}", &full[..pos], n.path),
                        None => n.path.clone(),
                    };
                    return Err(RouteError::WildcardConflict {
                        pattern: full.to_string(),
                        segment: segment.to_string(),
                        existing,
                    });
                }

                let idxc = path.as_bytes()[0];

                // '/' after a param node descends into its sole child
                if n.kind == NodeKind::Param && idxc == b'/' && n.children.len() == 1 {
                    let tmp = n;
                    n = &mut tmp.children[0];
                    n.priority += 1;
                    continue;
                }

                // Follow an existing edge sharing the first byte.
                if let Some(pos) = n.indices.iter().position(|&c| c == idxc) {
                    let pos = n.increment_child_prio(pos);
                    let tmp = n;
                    n = &mut tmp.children[pos];
                    continue;
                }

                // Append a new static edge, then let insert_child fill it.
                if idxc != b':' && idxc != b'*' {
                    n.indices.push(idxc);
                    n.children.push(Node::new());
                    let pos = n.increment_child_prio(n.indices.len() - 1);
                    let tmp = n;
                    n = &mut tmp.children[pos];
                }
                return n.insert_child(path, full, handler);
            }

            // Pattern fully consumed: this node becomes the terminal.
            if n.handler.is_some() {
                return Err(RouteError::DuplicateRoute {
                    pattern: full.to_string(),
                });
            }
            n.handler = Some(handler);
            n.pattern = Some(Arc::from(full));
            return Ok(());
        }
    }

    /// Insert the remaining `path` below this node, creating wildcard
    /// chains for `:param` and `*catchall` segments.
    fn insert_child(
        &mut self,
        path: &str,
        full: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let mut n: &mut Node = self;
        let mut path = path;

        loop {
            let Some((wildcard, i, valid)) = find_wildcard(path) else {
                // No wildcard left, store the literal tail here.
                n.path = path.to_string();
                n.handler = Some(handler);
                n.pattern = Some(Arc::from(full));
                return Ok(());
            };

            if !valid {
                return Err(RouteError::MultipleWildcards {
                    pattern: full.to_string(),
                    segment: wildcard.to_string(),
                });
            }
            if wildcard.len() < 2 {
                return Err(RouteError::UnnamedWildcard {
                    pattern: full.to_string(),
                });
            }

            // Children already below this node would become unreachable
            // behind the wildcard.
            if !n.children.is_empty() {
                return Err(RouteError::WildcardConflict {
                    pattern: full.to_string(),
                    segment: wildcard.to_string(),
                    existing: n.path.clone(),
                });
            }

            if wildcard.as_bytes()[0] == b':' {
                // Literal run before the wildcard stays on this node.
                if i > 0 {
                    n.path = path[..i].to_string();
                    path = &path[i..];
                }

                n.wild_child = true;
                n.children = vec![Node {
                    kind: NodeKind::Param,
                    path: wildcard.to_string(),
                    ..Node::new()
                }];
                let tmp = n;
                let wild = &mut tmp.children[0];
                wild.priority += 1;

                // More pattern after the param: continue below it.
                if wildcard.len() < path.len() {
                    path = &path[wildcard.len()..];
                    wild.children = vec![Node {
                        priority: 1,
                        ..Node::new()
                    }];
                    n = &mut wild.children[0];
                    continue;
                }

                wild.handler = Some(handler);
                wild.pattern = Some(Arc::from(full));
                return Ok(());
            }

            // Catch-all
            if i + wildcard.len() != path.len() {
                return Err(RouteError::CatchAllNotLast {
                    pattern: full.to_string(),
                });
            }
            if !n.path.is_empty() && n.path.ends_with('/') {
                return Err(RouteError::CatchAllRootConflict {
                    pattern: full.to_string(),
                });
            }
            if i == 0 || path.as_bytes()[i - 1] != b'/' {
                return Err(RouteError::CatchAllNoSlash {
                    pattern: full.to_string(),
                });
            }
            let i = i - 1;

            n.path = path[..i].to_string();

            // First node: empty-path catch-all reached through the '/'
            // index; second node holds the variable and the handler.
            n.indices = vec![b'/'];
            n.children = vec![Node {
                wild_child: true,
                kind: NodeKind::CatchAll,
                priority: 1,
                children: vec![Node {
                    path: path[i..].to_string(),
                    kind: NodeKind::CatchAll,
                    priority: 1,
                    handler: Some(handler),
                    pattern: Some(Arc::from(full)),
                    ..Node::new()
                }],
                ..Node::new()
            }];
            return Ok(());
        }
    }

    /// Bump the priority of the child at `pos` and shift it forward while
    /// it outranks its left neighbor. Returns the child's new position.
    fn increment_child_prio(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let prio = self.children[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < prio {
            self.children.swap(new_pos - 1, new_pos);
            self.indices.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }
        new_pos
    }

    /// Match `path` against the trie, appending captured parameters to
    /// `params` in pattern order.
    pub(crate) fn get_value(&self, path: &str, params: &mut Params) -> NodeLookup {
        let mut n = self;
        let mut path = path;

        loop {
            let prefix = n.path.as_str();

            if path.len() > prefix.len() {
                if &path.as_bytes()[..prefix.len()] == prefix.as_bytes() {
                    path = &path[prefix.len()..];

                    if !n.wild_child {
                        let idxc = path.as_bytes()[0];
                        if let Some(pos) = n.indices.iter().position(|&c| c == idxc) {
                            n = &n.children[pos];
                            continue;
                        }

                        // Dead end; the leaf one slash up may still exist.
                        let tsr = path == "/" && n.handler.is_some();
                        return NodeLookup::miss(tsr);
                    }

                    n = &n.children[0];
                    match n.kind {
                        NodeKind::Param => {
                            let end =
                                memchr::memchr(b'/', path.as_bytes()).unwrap_or(path.len());

                            // An empty segment never matches a param.
                            if end == 0 {
                                return NodeLookup::miss(false);
                            }

                            params.push(&n.path[1..], &path[..end]);

                            if end < path.len() {
                                if !n.children.is_empty() {
                                    path = &path[end..];
                                    n = &n.children[0];
                                    continue;
                                }

                                // Only a trailing slash remains.
                                let tsr = path.len() == end + 1;
                                return NodeLookup::miss(tsr);
                            }

                            if n.handler.is_some() {
                                return NodeLookup {
                                    handler: n.handler.clone(),
                                    pattern: n.pattern.clone(),
                                    tsr: false,
                                };
                            }
                            if n.children.len() == 1 {
                                let child = &n.children[0];
                                let tsr = (child.path == "/" && child.handler.is_some())
                                    || (child.path.is_empty() && child.indices == [b'/']);
                                return NodeLookup::miss(tsr);
                            }
                            return NodeLookup::miss(false);
                        }
                        NodeKind::CatchAll => {
                            params.push(&n.path[2..], path);
                            return NodeLookup {
                                handler: n.handler.clone(),
                                pattern: n.pattern.clone(),
                                tsr: false,
                            };
                        }
                        // Static and root nodes never sit behind wild_child.
                        NodeKind::Static | NodeKind::Root => return NodeLookup::miss(false),
                    }
                }
            } else if path == prefix {
                if n.handler.is_some() {
                    return NodeLookup {
                        handler: n.handler.clone(),
                        pattern: n.pattern.clone(),
                        tsr: false,
                    };
                }

                // The route exists with a trailing slash below a wildcard
                // or a static node.
                if path == "/" && n.wild_child && n.kind != NodeKind::Root {
                    return NodeLookup::miss(true);
                }
                if path == "/" && n.kind == NodeKind::Static {
                    return NodeLookup::miss(true);
                }

                if let Some(pos) = n.indices.iter().position(|&c| c == b'/') {
                    let child = &n.children[pos];
                    let tsr = (child.path.len() == 1 && child.handler.is_some())
                        || (child.kind == NodeKind::CatchAll
                            && child.children.first().is_some_and(|c| c.handler.is_some()));
                    return NodeLookup::miss(tsr);
                }

                return NodeLookup::miss(false);
            }

            // Nothing matched; recommend a redirect when the path is the
            // registered one minus its trailing slash.
            let tsr = path == "/"
                || (prefix.len() == path.len() + 1
                    && prefix.as_bytes()[path.len()] == b'/'
                    && path.as_bytes() == &prefix.as_bytes()[..prefix.len() - 1]
                    && n.handler.is_some());
            return NodeLookup::miss(tsr);
        }
    }

    /// Find `path` ignoring ASCII case, returning the path in its
    /// registered casing. With `fix_trailing_slash`, a missing or extra
    /// trailing slash is corrected in the result.
    pub(crate) fn find_case_insensitive(
        &self,
        path: &str,
        fix_trailing_slash: bool,
    ) -> Option<String> {
        let mut out = String::with_capacity(path.len() + 1);
        if self.ci_walk(path, fix_trailing_slash, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn ci_walk(&self, path: &str, fix: bool, out: &mut String) -> bool {
        let mark = out.len();
        let prefix = self.path.as_str();

        if path.len() < prefix.len() {
            // The request may be the registered path minus its trailing
            // slash.
            if fix
                && prefix.len() == path.len() + 1
                && prefix.ends_with('/')
                && path
                    .as_bytes()
                    .eq_ignore_ascii_case(&prefix.as_bytes()[..path.len()])
                && self.handler.is_some()
            {
                out.push_str(prefix);
                return true;
            }
            return false;
        }
        if !path.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes()) {
            return false;
        }

        out.push_str(prefix);
        // matched bytes differ only in ASCII letters, so this index is a
        // character boundary
        let rest = &path[prefix.len()..];

        if rest.is_empty() {
            if self.handler.is_some() {
                return true;
            }
            if fix {
                // The route may exist with a trailing slash.
                if let Some(pos) = self.indices.iter().position(|&c| c == b'/') {
                    let child = &self.children[pos];
                    if (child.path == "/" && child.handler.is_some())
                        || (child.kind == NodeKind::CatchAll
                            && child.children.first().is_some_and(|c| c.handler.is_some()))
                    {
                        out.push('/');
                        return true;
                    }
                }
            }
            out.truncate(mark);
            return false;
        }

        if self.wild_child {
            let child = &self.children[0];
            match child.kind {
                NodeKind::Param => {
                    let end = memchr::memchr(b'/', rest.as_bytes()).unwrap_or(rest.len());
                    if end == 0 {
                        out.truncate(mark);
                        return false;
                    }

                    // Captured values keep the request's casing.
                    out.push_str(&rest[..end]);

                    if end < rest.len() {
                        if let Some(grand) = child.children.first() {
                            if grand.ci_walk(&rest[end..], fix, out) {
                                return true;
                            }
                        } else if fix && rest.len() == end + 1 && child.handler.is_some() {
                            return true;
                        }
                        out.truncate(mark);
                        return false;
                    }

                    if child.handler.is_some() {
                        return true;
                    }
                    if fix && child.children.len() == 1 {
                        let grand = &child.children[0];
                        if grand.path == "/" && grand.handler.is_some() {
                            out.push('/');
                            return true;
                        }
                    }
                    out.truncate(mark);
                    return false;
                }
                NodeKind::CatchAll => {
                    out.push_str(rest);
                    return true;
                }
                NodeKind::Static | NodeKind::Root => {
                    out.truncate(mark);
                    return false;
                }
            }
        }

        // Try the exact first byte, then its case-swapped twin.
        let idxc = rest.as_bytes()[0];
        let swapped = swap_ascii_case(idxc);
        for candidate in [idxc, swapped] {
            if let Some(pos) = self.indices.iter().position(|&c| c == candidate) {
                if self.children[pos].ci_walk(rest, fix, out) {
                    return true;
                }
            }
            if swapped == idxc {
                break;
            }
        }

        // Extra trailing slash on this node's own handler.
        if fix && rest == "/" && self.handler.is_some() {
            return true;
        }

        out.truncate(mark);
        false
    }

    /// Highest-priority registered pattern check used by tests.
    #[cfg(test)]
    fn priority(&self) -> u32 {
        self.priority
    }
}
