//! Text rendering of instances and their ACLs as a tree.

use vaultacl::{AclDocument, Partition, PermissionRule, Tint};

use crate::instance::Instance;

const RESET: &str = "\x1b[0m";

/// One node of the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub label: String,
    pub tint: Option<Tint>,
    pub children: Vec<Node>,
}

impl Node {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tint: None,
            children: Vec::new(),
        }
    }

    fn tinted(mut self, tint: Tint) -> Self {
        self.tint = Some(tint);
        self
    }

    fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

/// Builds the tree for a set of instances.
pub fn build(instances: &[Instance]) -> Node {
    Node::new("Vault Instances").with_children(instances.iter().map(instance_node).collect())
}

fn instance_node(instance: &Instance) -> Node {
    let config = instance.config();
    let acl = instance.acl();

    let mut connection = vec![
        Node::new(format!("address: {}", config.url)),
        Node::new(format!("namespace: {}", config.display_namespace())),
        Node::new(format!("root: {}", acl.is_root())),
    ];
    if let Some(error) = instance.error() {
        connection.push(Node::new(format!("error: {error}")).tinted(Tint::Deny));
    }

    Node::new(instance.name()).tinted(Tint::Grant).with_children(vec![
        Node::new("Connection").with_children(connection),
        acl_node(&acl),
    ])
}

/// Builds the `ACL` subtree of one document.
pub fn acl_node(acl: &AclDocument) -> Node {
    let partitions = [Partition::Exact, Partition::Prefix]
        .into_iter()
        .map(|partition| {
            Node::new(partition.label())
                .tinted(acl.partition_tint(partition))
                .with_children(acl.rules(partition).rules().iter().map(rule_node).collect())
        })
        .collect();

    let label = if acl.is_root() { "ACL (root)" } else { "ACL" };
    Node::new(label).with_children(partitions)
}

fn rule_node(rule: &PermissionRule) -> Node {
    let node = Node::new(rule.path()).tinted(rule.tint());
    let Some(capabilities) = rule.capabilities() else {
        return node;
    };

    let tint = if capabilities.is_deny_only() {
        Tint::Deny
    } else {
        Tint::Grant
    };
    let names = capabilities.names().iter().map(Node::new).collect();
    node.with_children(vec![Node::new("Capabilities").tinted(tint).with_children(names)])
}

/// Renders a tree with box-drawing connectors.
///
/// With `color` set, tinted labels are wrapped in ANSI colors; otherwise deny
/// and unpopulated labels get a textual marker.
pub fn render(root: &Node, color: bool) -> String {
    let mut out = label(root, color);
    out.push('\n');
    render_children(&root.children, "", color, &mut out);
    out
}

fn render_children(children: &[Node], indent: &str, color: bool, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (branch, continuation) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        out.push_str(&format!("{indent}{branch}{}\n", label(child, color)));
        render_children(&child.children, &format!("{indent}{continuation}"), color, out);
    }
}

fn label(node: &Node, color: bool) -> String {
    match (node.tint, color) {
        (None, _) => node.label.clone(),
        (Some(tint), true) => format!("{}{}{RESET}", ansi(tint), node.label),
        (Some(Tint::Grant), false) => node.label.clone(),
        (Some(Tint::Deny), false) => format!("{} [deny]", node.label),
        (Some(Tint::Unpopulated), false) => format!("{} [unpopulated]", node.label),
    }
}

fn ansi(tint: Tint) -> &'static str {
    match tint {
        Tint::Grant => "\x1b[32m",
        Tint::Deny => "\x1b[31m",
        Tint::Unpopulated => "\x1b[2;31m",
    }
}
