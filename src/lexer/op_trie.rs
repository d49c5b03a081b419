use super::OpTrie;

impl OpTrie {
    pub fn new() -> Self {
        Self {
            terminal: false,
            children: Vec::new(),
        }
    }

    pub fn insert(&mut self, spelling: &[u8]) {
        if let Some((&first, rest)) = spelling.split_first() {
            match self.children.binary_search_by_key(&first, |child| child.0) {
                Ok(index) => self.children[index].1.insert(rest),
                Err(index) => {
                    let mut node = OpTrie::new();
                    node.insert(rest);
                    self.children.insert(index, (first, node));
                }
            }
        } else {
            self.terminal = true;
        }
    }

    /// Length of the longest operator spelling prefixing `code_part`, if any.
    pub fn find(&self, code_part: &[u8]) -> Option<usize> {
        let mut current = self;
        let mut index = 0;
        let mut matched = None;
        loop {
            if current.terminal {
                matched = Some(index);
            }
            if code_part.len() > index {
                match current
                    .children
                    .binary_search_by_key(&code_part[index], |child| child.0)
                {
                    Ok(i) => {
                        index += 1;
                        current = &current.children[i].1;
                    }
                    Err(_) => break matched,
                }
            } else {
                break matched;
            }
        }
    }
}
