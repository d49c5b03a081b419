use super::{Grammar, Item, Rhs, Rule};
use ptree::TreeItem;

#[derive(Clone)]
/// A plain labelled tree, renderable with ptree. The shape mirrors the IR so a
/// grammar author can see how the metagrammar parsed a rule.
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(&self.children)
    }
}

impl TreeNode {
    fn new(label: String, children: Vec<TreeNode>) -> Self {
        Self { label, children }
    }

    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

pub fn grammar_tree(grammar: &Grammar) -> TreeNode {
    TreeNode::new(
        "Grammar".to_string(),
        grammar.iter().map(rule_tree).collect(),
    )
}

pub fn rule_tree(rule: &Rule) -> TreeNode {
    TreeNode::new(format!("Rule:{}", rule.name), rhs_nodes(&rule.rhs))
}

fn rhs_nodes(rhs: &Rhs) -> Vec<TreeNode> {
    rhs.alts
        .iter()
        .map(|alt| {
            TreeNode::new(
                "Alt".to_string(),
                alt.items.iter().map(|named| item_tree(&named.item)).collect(),
            )
        })
        .collect()
}

fn item_tree(item: &Item) -> TreeNode {
    match item {
        Item::Name(name) => TreeNode::new(format!("Name:{}", name), Vec::new()),
        Item::Literal(literal) => TreeNode::new(format!("Literal:{}", literal), Vec::new()),
        Item::Group(rhs) => TreeNode::new("Group".to_string(), rhs_nodes(rhs)),
        Item::Opt(inner) => TreeNode::new("Opt".to_string(), vec![item_tree(inner)]),
        Item::Repeat0(inner) => TreeNode::new("Repeat0".to_string(), vec![item_tree(inner)]),
        Item::Repeat1(inner) => TreeNode::new("Repeat1".to_string(), vec![item_tree(inner)]),
        Item::Gather { separator, element } => TreeNode::new(
            "Gather".to_string(),
            vec![item_tree(separator), item_tree(element)],
        ),
        Item::PositiveLookahead(inner) => {
            TreeNode::new("PositiveLookahead".to_string(), vec![item_tree(inner)])
        }
        Item::NegativeLookahead(inner) => {
            TreeNode::new("NegativeLookahead".to_string(), vec![item_tree(inner)])
        }
        Item::Forced(inner) => TreeNode::new("Forced".to_string(), vec![item_tree(inner)]),
        Item::Cut => TreeNode::new("Cut".to_string(), Vec::new()),
    }
}
