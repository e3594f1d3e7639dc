use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::{Result, TreeError};
use crate::tree::{NodeKey, Tree};

#[derive(Debug, Clone)]
enum Bracket {
    Node(String, Vec<Bracket>),
    Word(String),
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')'
}

fn atom(input: &str) -> IResult<&str, &str> {
    take_while1(is_atom_char)(input)
}

fn word(input: &str) -> IResult<&str, Bracket> {
    map(atom, |w: &str| Bracket::Word(w.to_string()))(input)
}

fn bracket(input: &str) -> IResult<&str, Bracket> {
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, label) = opt(atom)(input)?;
    let (input, children) = many0(preceded(multispace0, alt((bracket, word))))(input)?;
    let (input, _) = preceded(multispace0, char(')'))(input)?;
    Ok((input, Bracket::Node(label.unwrap_or("").to_string(), children)))
}

fn build(tree: &mut Tree, parent: NodeKey, item: &Bracket, next_index: &mut usize) -> Result<()> {
    match item {
        Bracket::Word(w) => {
            tree.add_leaf(parent, w.as_str(), *next_index)?;
            *next_index += 1;
        }
        Bracket::Node(label, children) => {
            let key = tree.add_child(parent, label.as_str())?;
            for c in children {
                build(tree, key, c, next_index)?;
            }
        }
    }
    Ok(())
}

impl Tree {
    /// Parses Penn-style bracketed notation. Words are numbered 1.. from
    /// left to right. An unlabeled outer wrapper around a single tree,
    /// as in `( (S ...) )`, is dropped.
    pub fn from_bracketed(input: &str) -> Result<Tree> {
        let (_, parsed) = all_consuming(delimited(multispace0, bracket, multispace0))(input)
            .map_err(|e| TreeError::Parse(e.to_string()))?;

        let parsed = match parsed {
            Bracket::Node(label, mut children)
                if label.is_empty()
                    && children.len() == 1
                    && matches!(children[0], Bracket::Node(..)) =>
            {
                children.remove(0)
            }
            other => other,
        };

        let Bracket::Node(label, children) = parsed else {
            return Err(TreeError::Parse("expected a bracketed node".to_string()));
        };
        let mut tree = Tree::new(label);
        let root = tree.root();
        let mut next_index = 1;
        for c in &children {
            build(&mut tree, root, c, &mut next_index)?;
        }
        Ok(tree)
    }
}
